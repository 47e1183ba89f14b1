use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use log::{info, warn};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::http::handle_request;
use crate::middleware::logging::{log_connection, log_request};
use crate::server::core::AppContext;

/// Serves HTTP/1.1 requests on one connection until the client closes it.
///
/// hyper handles framing, keep-alive and `Expect: 100-continue`; requests on a
/// connection are handled one at a time.
pub async fn handle_connection(stream: TcpStream, client_addr: SocketAddr, ctx: Arc<AppContext>) {
    log_connection(&client_addr);

    let max_buf_size = ctx.config.max_header_bytes;
    let service = service_fn(move |request: Request<Incoming>| {
        let ctx = Arc::clone(&ctx);
        async move {
            let method = request.method().clone();
            let target = request.uri().to_string();
            let response = handle_request(request, &ctx).await;
            log_request(&client_addr, method.as_str(), &target, response.status());
            Ok::<_, Infallible>(response)
        }
    });

    if let Err(e) = http1::Builder::new()
        .max_buf_size(max_buf_size)
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        warn!("Connection error from {}: {}", client_addr, e);
    }

    info!("Client {} disconnected", client_addr);
}
