//! [`SettlementService`] that posts settlement requests to a remote HTTP endpoint.

use reqwest::Client;
use url::Url;

use crate::settlement::{SettlementReceipt, SettlementRequest, SettlementService};

#[derive(Debug, thiserror::Error)]
pub enum HttpSettlementError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Settlement rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sends each request as a JSON `POST` to a fixed endpoint and expects a
/// [`SettlementReceipt`] back.
#[derive(Debug, Clone)]
pub struct HttpSettlementService {
    client: Client,
    endpoint: Url,
}

impl HttpSettlementService {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl SettlementService for HttpSettlementService {
    type Error = HttpSettlementError;

    async fn settle(
        &self,
        request: &SettlementRequest,
    ) -> Result<SettlementReceipt, HttpSettlementError> {
        tracing::debug!(
            "POST {} for report {}",
            self.endpoint,
            request.report_id
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpSettlementError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<SettlementReceipt>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment_method::PaymentMethod;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn request() -> SettlementRequest {
        SettlementRequest {
            report_id: 42,
            chat_report_id: 9,
            payment_method_type: PaymentMethod::PayPalLike,
            amount: 1_250,
            currency: "USD".to_string(),
            submitter_paypal_me_address: Some("alice".to_string()),
            submitter_phone_number: None,
        }
    }

    fn local_service(url: Url) -> HttpSettlementService {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpSettlementService::with_client(client, url)
    }

    /// Reads one HTTP request and returns its body.
    async fn read_body(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before request finished");
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_string();
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            let body = &buf[header_end + 4..];
            if body.len() >= content_length {
                return String::from_utf8_lossy(&body[..content_length]).to_string();
            }
        }
    }

    /// Answers a single request with `status` and `body`, handing back what was posted.
    async fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let posted = read_body(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            posted
        });
        let url = Url::parse(&format!("http://{addr}/iou/settle")).unwrap();
        (url, handle)
    }

    #[tokio::test]
    async fn test_success_parses_receipt() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"reportID":42,"paymentMethodType":"paypal-me","reference":"txn-7"}"#,
        )
        .await;
        let service = local_service(url);

        let receipt = service.settle(&request()).await.unwrap();
        assert_eq!(receipt.report_id, 42);
        assert_eq!(receipt.payment_method_type, PaymentMethod::PayPalLike);
        assert_eq!(receipt.reference.as_deref(), Some("txn-7"));

        let posted: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(posted["reportID"], 42);
        assert_eq!(posted["chatReportID"], 9);
        assert_eq!(posted["paymentMethodType"], "paypal-me");
        assert_eq!(posted["submitterPaypalMeAddress"], "alice");
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        for (status, code) in [("409 Conflict", 409u16), ("503 Service Unavailable", 503)] {
            let (url, server) = serve_once(status, r#"{"error":"report already settled"}"#).await;
            let service = local_service(url);

            match service.settle(&request()).await {
                Err(HttpSettlementError::Rejected { status, body }) => {
                    assert_eq!(status, code);
                    assert!(body.contains("report already settled"));
                }
                other => panic!("expected Rejected, got {:?}", other),
            }
            server.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/iou/settle")).unwrap();
        let service = local_service(url);
        let result = service.settle(&request()).await;
        assert!(matches!(result, Err(HttpSettlementError::Transport(_))));
    }

    #[tokio::test]
    async fn test_malformed_receipt_is_error() {
        let (url, server) = serve_once("200 OK", "not json").await;
        let service = local_service(url);

        let result = service.settle(&request()).await;
        assert!(matches!(result, Err(HttpSettlementError::Transport(_))));
        server.await.unwrap();
    }
}
