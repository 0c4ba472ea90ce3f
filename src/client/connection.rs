//! Low-level connection: request encoding, response decoding, one round trip
//! per call.

use crate::config::Credentials;
use crate::error::{BaoError, ErrorCode};
use crate::frame::reader::DEFAULT_MAX_BODY_LEN;
use crate::message::decode::decode_response_limited;
use crate::message::encode::encode_request;
use crate::message::{AuthReply, Query, QueryPage, Request, Response};
use crate::transport::Transport;

/// A connection that speaks BaoStock messages over a [`Transport`].
///
/// Keeps no login state of its own; see [`crate::client::BaoClient`] for that.
pub struct Connection<T> {
    transport: T,
    max_body_len: u64,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_body_len: DEFAULT_MAX_BODY_LEN,
        }
    }

    /// Caps the decompressed size of a response body.
    pub fn with_max_body_len(mut self, max: u64) -> Self {
        self.max_body_len = max;
        self
    }

    /// Encodes and sends a request.
    pub async fn send(&mut self, req: &Request) -> Result<(), BaoError> {
        let envelope = encode_request(req)?;
        tracing::debug!(
            msg_type = req.msg_type(),
            bytes = envelope.len(),
            "sending request"
        );
        self.transport.send_request(&envelope).await
    }

    /// Receives and decodes one response.
    pub async fn recv(&mut self) -> Result<Response, BaoError> {
        let envelope = self.transport.receive_response().await?;
        let response = decode_response_limited(&envelope, self.max_body_len)?;
        tracing::debug!(
            response = response.name(),
            bytes = envelope.len(),
            "received response"
        );
        Ok(response)
    }

    /// Sends a login request and returns the server's verdict.
    pub async fn login(&mut self, creds: &Credentials) -> Result<AuthReply, BaoError> {
        self.send(&Request::Login {
            user_id: creds.user_id.clone(),
            password: creds.password.clone(),
            options: creds.options.clone(),
        })
        .await?;
        match self.recv().await? {
            Response::Login(reply) => Ok(reply),
            Response::Error { code, message } => Ok(error_reply(code, message, "login")),
            other => Err(BaoError::Protocol(format!(
                "expected login response, got {}",
                other.name()
            ))),
        }
    }

    /// Sends a logout request. `timestamp` is in Unix seconds.
    pub async fn logout(&mut self, user_id: &str, timestamp: u64) -> Result<AuthReply, BaoError> {
        self.send(&Request::Logout {
            user_id: user_id.to_string(),
            timestamp,
        })
        .await?;
        match self.recv().await? {
            Response::Logout(reply) => Ok(reply),
            Response::Error { code, message } => Ok(error_reply(code, message, "logout")),
            other => Err(BaoError::Protocol(format!(
                "expected logout response, got {}",
                other.name()
            ))),
        }
    }

    /// Requests one page of `query`.
    ///
    /// A successful page must echo the code (and, for dividends, the year) it
    /// was asked for; anything else is a [`BaoError::Protocol`] error.
    pub async fn query_page(
        &mut self,
        user_id: &str,
        page: u32,
        page_size: u32,
        query: &Query,
    ) -> Result<QueryPage, BaoError> {
        self.send(&Request::Query {
            user_id: user_id.to_string(),
            page,
            page_size,
            query: query.clone(),
        })
        .await?;
        match (query, self.recv().await?) {
            (Query::Dividend(_), Response::Dividend(page))
            | (Query::KData(_), Response::KData(page)) => {
                check_echo(query, &page)?;
                Ok(page)
            }
            (_, Response::Error { code, message }) => Ok(QueryPage {
                code,
                message,
                method: query.method().to_string(),
                ..QueryPage::default()
            }),
            (_, other) => Err(BaoError::Protocol(format!(
                "expected {} response, got {}",
                query.method(),
                other.name()
            ))),
        }
    }

    /// Closes the write side of the transport.
    pub async fn close(&mut self) -> Result<(), BaoError> {
        self.transport.shutdown().await
    }
}

/// Compares the parameters a page echoes back with the ones sent. Fields the
/// server left empty are not compared.
fn check_echo(query: &Query, page: &QueryPage) -> Result<(), BaoError> {
    if !page.code.is_success() {
        return Ok(());
    }
    // Both layouts echo the code first; dividends echo the year next.
    let sent = match query {
        Query::Dividend(q) => vec![q.code.as_str(), q.year.as_str()],
        Query::KData(q) => vec![q.code.as_str()],
    };
    for (&want, got) in sent.iter().zip(&page.params) {
        if !got.is_empty() && got.as_str() != want {
            return Err(BaoError::Protocol(format!(
                "response is for {got:?}, request was for {want:?}"
            )));
        }
    }
    Ok(())
}

fn error_reply(code: ErrorCode, message: String, method: &str) -> AuthReply {
    AuthReply {
        code,
        message,
        method: method.to_string(),
        user_id: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockTransport;
    use crate::message::encode::encode_message;
    use crate::message::{msg_type, DividendQuery, YearType};

    fn dividend() -> Query {
        Query::Dividend(DividendQuery {
            code: "sh.600000".into(),
            year: "2020".into(),
            year_type: YearType::Report,
        })
    }

    #[tokio::test]
    async fn login_round_trip() {
        let mock = MockTransport::new().reply(
            msg_type::LOGIN_RESPONSE,
            &["0", "success", "login", "anonymous"],
        );
        let sent = mock.sent();
        let mut conn = Connection::new(mock);

        let reply = conn.login(&Credentials::anonymous()).await.unwrap();
        assert_eq!(reply.code, ErrorCode::Success);
        assert_eq!(reply.user_id, "anonymous");

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with(b"00"));
    }

    #[tokio::test]
    async fn error_message_becomes_failed_reply() {
        let mock = MockTransport::new().reply(msg_type::ERROR, &["10001002", "wrong password"]);
        let mut conn = Connection::new(mock);

        let reply = conn.login(&Credentials::anonymous()).await.unwrap();
        assert_eq!(reply.code, ErrorCode::BadCredentials);
        assert_eq!(reply.message, "wrong password");
        assert_eq!(reply.method, "login");
    }

    #[tokio::test]
    async fn mismatched_response_is_protocol_error() {
        let mock = MockTransport::new().reply(
            msg_type::LOGOUT_RESPONSE,
            &["0", "success", "logout", "anonymous"],
        );
        let mut conn = Connection::new(mock);

        let err = conn
            .query_page("anonymous", 1, 100, &dividend())
            .await
            .unwrap_err();
        assert!(matches!(err, BaoError::Protocol(_)));
    }

    fn dividend_page(code: &str, year: &str) -> Vec<String> {
        [
            "0",
            "success",
            "query_dividend_data",
            "anonymous",
            "1",
            "100",
            r#"{"record":[]}"#,
            "code",
            code,
            year,
            "report",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[tokio::test]
    async fn page_for_another_request_is_rejected() {
        let stale = encode_message(msg_type::DIVIDEND_RESPONSE, &dividend_page("sh.600000", "2019"))
            .unwrap();
        let mut conn = Connection::new(MockTransport::new().reply_raw(stale));

        let err = conn
            .query_page("anonymous", 1, 100, &dividend())
            .await
            .unwrap_err();
        assert!(matches!(err, BaoError::Protocol(_)));
    }

    #[tokio::test]
    async fn matching_echo_is_accepted() {
        let page = encode_message(msg_type::DIVIDEND_RESPONSE, &dividend_page("sh.600000", "2020"))
            .unwrap();
        let mut conn = Connection::new(MockTransport::new().reply_raw(page));

        let page = conn
            .query_page("anonymous", 1, 100, &dividend())
            .await
            .unwrap();
        assert_eq!(page.params, ["sh.600000", "2020", "report"]);
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let mut conn = Connection::new(MockTransport::new());
        let err = conn.logout("anonymous", 0).await.unwrap_err();
        assert!(matches!(err, BaoError::Recv(_)));
    }
}
