//! High-level client: connect, log in, run queries, page through results.

use std::time::{SystemTime, UNIX_EPOCH};

use super::connection::Connection;
use super::result::{ResultData, ResultSet};
use super::session::{PageCursor, Session};
use super::state_machine::{ClientState, Operation};
use super::validate;
use crate::config::{ClientConfig, Credentials};
use crate::error::{BaoError, ErrorCode};
use crate::message::{KDataQuery, Query};
use crate::transport::{TcpTransport, Transport};

/// A BaoStock client: one connection and one session.
///
/// Every network call takes `&mut self`, so requests on one client never
/// interleave. Use one client per task for parallel fetching.
///
/// Local validation failures and server-side errors come back as `Ok` with a
/// non-success `error_code`. Transport and decoding failures come back as
/// `Err`.
pub struct BaoClient<T = TcpTransport> {
    conn: Option<Connection<T>>,
    session: Session,
    state: ClientState,
    config: ClientConfig,
}

impl BaoClient<TcpTransport> {
    /// Opens a TCP connection to the server named in `config`.
    pub async fn connect(config: ClientConfig) -> Result<Self, BaoError> {
        let transport = TcpTransport::connect_with(&config).await?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> BaoClient<T> {
    /// Builds a client over an already-open transport.
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            conn: Some(Connection::new(transport).with_max_body_len(config.max_body_len)),
            session: Session::new(),
            state: ClientState::Connected,
            config,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Logs in. A rejected login leaves the session untouched.
    pub async fn login(&mut self, creds: &Credentials) -> Result<ResultData, BaoError> {
        if !self.state.accepts(Operation::Login) {
            return Err(BaoError::NotConnected);
        }
        let conn = self.conn.as_mut().ok_or(BaoError::NotConnected)?;
        if let Err(r) = validate::credentials(creds) {
            return Ok(ResultData::local(r.code, r.message, "login"));
        }

        let result = conn.login(creds).await;
        let reply = self.poison_on_error(result)?;
        match self
            .session
            .login(reply.code, &reply.message, &reply.user_id)
        {
            Ok(user_id) => {
                tracing::info!(user_id, "logged in");
                self.state = self.state.transition_success(Operation::Login, false);
                Ok(reply.into())
            }
            Err(e) => {
                tracing::warn!(code = %e.code, message = %e.message, "login rejected");
                Ok(ResultData {
                    error_code: e.code,
                    error_msg: e.message,
                    method: reply.method,
                    user_id: String::new(),
                })
            }
        }
    }

    /// Logs out. Logging out without a session succeeds without touching the
    /// network.
    pub async fn logout(&mut self) -> Result<ResultData, BaoError> {
        let conn = self.conn.as_mut().ok_or(BaoError::NotConnected)?;
        if !self.state.accepts(Operation::Logout) || !self.session.is_logged_in() {
            return Ok(ResultData::local(
                ErrorCode::Success,
                ErrorCode::Success.default_message(),
                "logout",
            ));
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let result = conn.logout(self.session.user_id(), timestamp).await;
        let reply = self.poison_on_error(result)?;
        if reply.code.is_success() {
            tracing::info!(user_id = self.session.user_id(), "logged out");
            self.session.logout();
            self.state = self.state.transition_success(Operation::Logout, false);
        } else {
            tracing::warn!(code = %reply.code, message = %reply.message, "logout rejected");
        }
        Ok(reply.into())
    }

    /// Runs a query by method name with `key=value` parameters.
    ///
    /// Knows `query_dividend_data` (`code`, `year`, `yearType`) and
    /// `query_history_k_data_plus` (`code`, `fields`, `start_date`,
    /// `end_date`, `frequency`, `adjustflag`).
    pub async fn query(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<ResultSet, BaoError> {
        self.ensure_connected()?;
        match validate::query_from_params(name, params) {
            Ok(query) => self.fetch_first(query).await,
            Err(r) => Ok(ResultSet::rejected(r, name)),
        }
    }

    /// Dividend plans of `code` for `year`. An empty `year_type` means
    /// `report`.
    pub async fn query_dividend_data(
        &mut self,
        code: &str,
        year: &str,
        year_type: &str,
    ) -> Result<ResultSet, BaoError> {
        self.ensure_connected()?;
        match validate::dividend_query(code, year, year_type) {
            Ok(query) => self.fetch_first(query).await,
            Err(r) => Ok(ResultSet::rejected(r, Query::DIVIDEND_METHOD)),
        }
    }

    /// K-line bars of `code`. `fields` is comma separated.
    pub async fn query_history_k_data_plus(
        &mut self,
        code: &str,
        fields: &str,
        start_date: &str,
        end_date: &str,
        frequency: &str,
        adjust_flag: &str,
    ) -> Result<ResultSet, BaoError> {
        self.ensure_connected()?;
        match validate::k_data_query(code, fields, start_date, end_date, frequency, adjust_flag) {
            Ok(query) => self.fetch_first(query).await,
            Err(r) => Ok(ResultSet::rejected(r, Query::K_DATA_METHOD)),
        }
    }

    /// K-line bars from an already typed query.
    pub async fn query_history_k_data(
        &mut self,
        query: &KDataQuery,
    ) -> Result<ResultSet, BaoError> {
        self.execute(Query::KData(query.clone())).await
    }

    /// Validates and runs a typed query, returning its first page.
    pub async fn execute(&mut self, query: Query) -> Result<ResultSet, BaoError> {
        self.ensure_connected()?;
        match validate::check_query(&query) {
            Ok(()) => self.fetch_first(query).await,
            Err(r) => Ok(ResultSet::rejected(r, query.method())),
        }
    }

    /// Fetches the page after `prev`, or `None` once `prev` was the last one.
    ///
    /// Continues from the session cursor when it points at `prev`, otherwise
    /// from the page numbers `prev` carries.
    pub async fn next_page(&mut self, prev: &ResultSet) -> Result<Option<ResultSet>, BaoError> {
        self.ensure_connected()?;
        let query = match &prev.query {
            Some(query) if prev.has_more() => query.clone(),
            _ => {
                self.finish_paging();
                return Ok(None);
            }
        };

        let at = match self.session.cursor() {
            Some(cursor) if cursor.cur_page_num == prev.cur_page_num => cursor,
            _ => PageCursor {
                cur_page_num: prev.cur_page_num,
                per_page_count: prev.per_page_count,
            },
        };
        let Some(next) = at.next() else {
            tracing::warn!(page = at.cur_page_num, "no page number left, stopping");
            self.finish_paging();
            return Ok(None);
        };
        self.fetch_page(query, next).await.map(Some)
    }

    /// Appends every remaining page to `first`.
    ///
    /// A failed page is returned as-is in place of the merged result.
    pub async fn fetch_all(&mut self, first: ResultSet) -> Result<ResultSet, BaoError> {
        let mut all = first;
        let (Some(query), true) = (all.query.clone(), all.has_more()) else {
            self.finish_paging();
            return Ok(all);
        };

        let mut at = PageCursor {
            cur_page_num: all.cur_page_num,
            per_page_count: all.per_page_count,
        };
        while let Some(next) = at.next() {
            let page = self.fetch_page(query.clone(), next).await?;
            if !page.is_success() {
                return Ok(page);
            }
            if page.cur_page_num < next.cur_page_num {
                tracing::warn!(
                    requested = next.cur_page_num,
                    received = page.cur_page_num,
                    "server did not advance the page, stopping"
                );
                break;
            }
            at = PageCursor {
                cur_page_num: page.cur_page_num,
                per_page_count: page.per_page_count,
            };
            let more = page.has_more();
            all.rows.extend(page.rows);
            if !more {
                break;
            }
        }

        all.cur_page_num = at.cur_page_num;
        self.finish_paging();
        Ok(all)
    }

    /// Drops the session and closes the connection. Safe to call twice.
    pub async fn disconnect(&mut self) -> Result<(), BaoError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        self.session.logout();
        self.state = self.state.transition_success(Operation::Disconnect, false);
        conn.close().await?;
        tracing::info!("disconnected");
        Ok(())
    }

    fn ensure_connected(&self) -> Result<(), BaoError> {
        if self.conn.is_some() {
            Ok(())
        } else {
            Err(BaoError::NotConnected)
        }
    }

    /// Passes `result` through. On failure the connection is dropped, since
    /// part of the failed response may still be unread on the stream.
    fn poison_on_error<R>(&mut self, result: Result<R, BaoError>) -> Result<R, BaoError> {
        match result {
            // Rejected while encoding; nothing was sent.
            Err(BaoError::InvalidField(e)) => Err(BaoError::InvalidField(e)),
            Err(e) => {
                tracing::warn!(error = %e, "exchange failed, dropping connection");
                self.conn = None;
                self.session.logout();
                self.state = self.state.transition_success(Operation::Disconnect, false);
                Err(e)
            }
            ok => ok,
        }
    }

    fn finish_paging(&mut self) {
        self.state = self.state.complete_paging();
        self.session.clear_cursor();
    }

    async fn fetch_first(&mut self, query: Query) -> Result<ResultSet, BaoError> {
        let first = PageCursor {
            cur_page_num: 1,
            per_page_count: self.config.per_page_count,
        };
        self.fetch_page(query, first).await
    }

    async fn fetch_page(&mut self, query: Query, at: PageCursor) -> Result<ResultSet, BaoError> {
        let method = query.method();
        let conn = self.conn.as_mut().ok_or(BaoError::NotConnected)?;
        if !self.state.accepts(Operation::Query) || self.session.require_login().is_err() {
            let code = ErrorCode::NotLoggedIn;
            return Ok(ResultSet::failure(code, code.default_message(), method));
        }

        let result = conn
            .query_page(
                self.session.user_id(),
                at.cur_page_num,
                at.per_page_count,
                &query,
            )
            .await;
        let reply = self.poison_on_error(result)?;
        let rs = ResultSet::from_page(reply, query);
        if rs.is_success() {
            tracing::debug!(
                method,
                page = rs.cur_page_num,
                rows = rs.rows.len(),
                "page received"
            );
            if rs.has_more() {
                self.session.set_cursor(PageCursor {
                    cur_page_num: rs.cur_page_num,
                    per_page_count: rs.per_page_count,
                });
            } else {
                self.session.clear_cursor();
            }
            self.state = self
                .state
                .transition_success(Operation::Query, rs.has_more());
        } else {
            tracing::warn!(method, code = %rs.error_code, message = %rs.error_msg, "query failed");
        }
        Ok(rs)
    }
}
