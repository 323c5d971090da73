//! ESP-IDF HTTP server adapter.
//!
//! Registers one wildcard handler per method and hands every request to
//! the shared [`Runtime`].  The handler copies the URI, the
//! `Authorization` header and the form body into an owned
//! [`HttpRequest`], so routing and rendering stay testable on the host.
//!
//! A follow-up (restart, firmware install) runs on its own thread once
//! the reply has been written, after a short grace period that lets the
//! browser receive it.

use core::time::Duration;

use embedded_svc::http::{Headers, Method as SvcMethod};
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::server::{Configuration as HttpConfiguration, EspHttpServer};
use log::{info, warn};

use crate::app::commands::FollowUp;
use crate::http::request::MAX_BODY;
use crate::http::{HttpRequest, HttpResponse, Method};
use crate::runtime::{self, SharedRuntime};

const SERVER_STACK_SIZE: usize = 16 * 1024;
/// TLS download plus flash writes need more room than a request handler.
const FOLLOW_UP_STACK_SIZE: usize = 24 * 1024;
const FOLLOW_UP_DELAY: Duration = Duration::from_millis(500);

/// Start the server. Dropping the returned value stops it.
pub fn start(shared: SharedRuntime) -> anyhow::Result<EspHttpServer<'static>> {
    let conf = HttpConfiguration {
        stack_size: SERVER_STACK_SIZE,
        uri_match_wildcard: true,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&conf)?;

    for (svc_method, method) in [(SvcMethod::Get, Method::Get), (SvcMethod::Post, Method::Post)] {
        let shared = shared.clone();
        server.fn_handler::<anyhow::Error, _>("/*", svc_method, move |mut req| {
            let declared = req.content_len().unwrap_or(0) as usize;
            if declared > MAX_BODY {
                warn!("HTTP: body of {} bytes refused", declared);
                req.into_response(413, None, &[("Content-Type", "text/plain")])?
                    .write_all(b"Request too large")?;
                return Ok(());
            }

            let mut body = vec![0u8; declared];
            if declared > 0 {
                req.read_exact(&mut body)?;
            }

            let mut request = HttpRequest::new(method, req.uri())
                .with_body(&String::from_utf8_lossy(&body));
            if let Some(value) = req.header("Authorization") {
                request = request.with_authorization(value);
            }

            let routed = runtime::lock(&shared).handle(&request);
            write_response(req, &routed.response)?;

            if let Some(follow_up) = routed.follow_up {
                spawn_follow_up(shared.clone(), follow_up)?;
            }
            Ok(())
        })?;
    }

    info!("HTTP: server listening on port {}", conf.http_port);
    Ok(server)
}

fn write_response(
    req: esp_idf_svc::http::server::Request<&mut esp_idf_svc::http::server::EspHttpConnection<'_>>,
    response: &HttpResponse,
) -> anyhow::Result<()> {
    let mut headers: Vec<(&str, &str)> = Vec::with_capacity(response.headers.len() + 1);
    headers.push(("Content-Type", response.content_type));
    headers.extend(response.headers.iter().map(|(n, v)| (*n, v.as_str())));

    req.into_response(response.status, None, &headers)?
        .write_all(response.body.as_bytes())?;
    Ok(())
}

fn spawn_follow_up(shared: SharedRuntime, follow_up: FollowUp) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("follow-up".into())
        .stack_size(FOLLOW_UP_STACK_SIZE)
        .spawn(move || {
            std::thread::sleep(FOLLOW_UP_DELAY);
            runtime::lock(&shared).run_follow_up(follow_up);
        })?;
    Ok(())
}
