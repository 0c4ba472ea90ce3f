//! Client-to-server BaoStock messages.

use super::msg_type;
use crate::body::{encode_attributes, SeparatorInValue};

/// A message sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Open an authenticated session.
    Login {
        user_id: String,
        password: String,
        options: String,
    },

    /// Close the authenticated session. `timestamp` is in Unix seconds.
    Logout { user_id: String, timestamp: u64 },

    /// Fetch one page of a query.
    Query {
        user_id: String,
        page: u32,
        page_size: u32,
        query: Query,
    },
}

impl Request {
    pub fn msg_type(&self) -> u8 {
        match self {
            Self::Login { .. } => msg_type::LOGIN_REQUEST,
            Self::Logout { .. } => msg_type::LOGOUT_REQUEST,
            Self::Query { query, .. } => query.request_type(),
        }
    }

    /// The positional body fields of this request.
    pub fn fields(&self) -> Result<Vec<String>, SeparatorInValue> {
        Ok(match self {
            Self::Login {
                user_id,
                password,
                options,
            } => vec![
                "login".to_string(),
                user_id.clone(),
                password.clone(),
                options.clone(),
            ],
            Self::Logout { user_id, timestamp } => {
                vec!["logout".to_string(), user_id.clone(), timestamp.to_string()]
            }
            Self::Query {
                user_id,
                page,
                page_size,
                query,
            } => {
                let mut fields = vec![
                    query.method().to_string(),
                    user_id.clone(),
                    page.to_string(),
                    page_size.to_string(),
                ];
                fields.extend(query.params()?);
                fields
            }
        })
    }
}

/// The queries the server answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Dividend(DividendQuery),
    KData(KDataQuery),
}

impl Query {
    pub const DIVIDEND_METHOD: &'static str = "query_dividend_data";
    pub const K_DATA_METHOD: &'static str = "query_history_k_data_plus";

    pub fn method(&self) -> &'static str {
        match self {
            Self::Dividend(_) => Self::DIVIDEND_METHOD,
            Self::KData(_) => Self::K_DATA_METHOD,
        }
    }

    pub fn request_type(&self) -> u8 {
        match self {
            Self::Dividend(_) => msg_type::DIVIDEND_REQUEST,
            Self::KData(_) => msg_type::K_DATA_REQUEST,
        }
    }

    pub fn response_type(&self) -> u8 {
        match self {
            Self::Dividend(_) => msg_type::DIVIDEND_RESPONSE,
            Self::KData(_) => msg_type::K_DATA_RESPONSE,
        }
    }

    /// Query-specific parameters, in wire order.
    pub fn params(&self) -> Result<Vec<String>, SeparatorInValue> {
        Ok(match self {
            Self::Dividend(q) => vec![
                q.code.clone(),
                q.year.clone(),
                q.year_type.as_str().to_string(),
            ],
            Self::KData(q) => vec![
                q.code.clone(),
                encode_attributes(&q.fields)?,
                q.start_date.clone(),
                q.end_date.clone(),
                q.frequency.as_str().to_string(),
                q.adjust_flag.as_str().to_string(),
            ],
        })
    }
}

/// Dividend history of one security for one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DividendQuery {
    /// Security code, e.g. `sh.600000`.
    pub code: String,
    /// Four-digit year.
    pub year: String,
    pub year_type: YearType,
}

/// Which calendar a dividend year refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearType {
    /// Year the plan was announced.
    #[default]
    Report,
    /// Year the plan was carried out.
    Operate,
}

impl YearType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Operate => "operate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "report" => Some(Self::Report),
            "operate" => Some(Self::Operate),
            _ => None,
        }
    }
}

/// Historical K-line (candlestick) data for one security.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KDataQuery {
    pub code: String,
    /// Requested columns, e.g. `date`, `open`, `close`.
    pub fields: Vec<String>,
    /// `YYYY-MM-DD`.
    pub start_date: String,
    /// `YYYY-MM-DD`, or empty for "up to today".
    pub end_date: String,
    pub frequency: Frequency,
    pub adjust_flag: AdjustFlag,
}

/// Bar width of a K-data query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Min5,
    Min15,
    Min30,
    Min60,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "d",
            Self::Weekly => "w",
            Self::Monthly => "m",
            Self::Min5 => "5",
            Self::Min15 => "15",
            Self::Min30 => "30",
            Self::Min60 => "60",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "d" => Some(Self::Daily),
            "w" => Some(Self::Weekly),
            "m" => Some(Self::Monthly),
            "5" => Some(Self::Min5),
            "15" => Some(Self::Min15),
            "30" => Some(Self::Min30),
            "60" => Some(Self::Min60),
            _ => None,
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self, Self::Min5 | Self::Min15 | Self::Min30 | Self::Min60)
    }
}

/// Price adjustment applied to K-data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjustFlag {
    /// Backward adjusted.
    Backward,
    /// Forward adjusted.
    Forward,
    /// Unadjusted prices.
    #[default]
    None,
}

impl AdjustFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backward => "1",
            Self::Forward => "2",
            Self::None => "3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Self::Backward),
            "2" => Some(Self::Forward),
            "3" => Some(Self::None),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_fields() {
        let req = Request::Login {
            user_id: "anonymous".into(),
            password: "123456".into(),
            options: "0".into(),
        };
        assert_eq!(req.msg_type(), msg_type::LOGIN_REQUEST);
        assert_eq!(req.fields().unwrap(), ["login", "anonymous", "123456", "0"]);
    }

    #[test]
    fn dividend_query_fields() {
        let req = Request::Query {
            user_id: "anonymous".into(),
            page: 1,
            page_size: 10000,
            query: Query::Dividend(DividendQuery {
                code: "sh.600000".into(),
                year: "2020".into(),
                year_type: YearType::Report,
            }),
        };
        assert_eq!(req.msg_type(), msg_type::DIVIDEND_REQUEST);
        assert_eq!(
            req.fields().unwrap(),
            [
                "query_dividend_data",
                "anonymous",
                "1",
                "10000",
                "sh.600000",
                "2020",
                "report"
            ]
        );
    }

    #[test]
    fn k_data_fields_are_attribute_encoded() {
        let query = Query::KData(KDataQuery {
            code: "sz.000001".into(),
            fields: vec!["date".into(), "close".into()],
            start_date: "2020-01-01".into(),
            end_date: String::new(),
            frequency: Frequency::Weekly,
            adjust_flag: AdjustFlag::Forward,
        });
        assert_eq!(
            query.params().unwrap(),
            ["sz.000001", "date,close", "2020-01-01", "", "w", "2"]
        );
        assert_eq!(query.response_type(), msg_type::K_DATA_RESPONSE);
    }

    #[test]
    fn parse_enums() {
        assert_eq!(Frequency::parse("D"), Some(Frequency::Daily));
        assert_eq!(Frequency::parse("15"), Some(Frequency::Min15));
        assert_eq!(Frequency::parse("2"), None);
        assert!(Frequency::Min60.is_intraday());
        assert_eq!(AdjustFlag::parse("3"), Some(AdjustFlag::None));
        assert_eq!(AdjustFlag::parse("4"), None);
        assert_eq!(YearType::parse("operate"), Some(YearType::Operate));
        assert_eq!(YearType::parse("fiscal"), None);
    }
}
