//! Local request validation, run before anything touches the network.
//!
//! Every check mirrors a result code the server itself would send, so a
//! rejected request looks the same to the caller whether it was refused here
//! or remotely.

use crate::body::check_value;
use crate::config::Credentials;
use crate::error::ErrorCode;
use crate::message::{AdjustFlag, DividendQuery, Frequency, KDataQuery, Query, YearType};

/// Earliest trading day the server has data for.
pub const FIRST_TRADING_DAY: (u32, u32, u32) = (1990, 12, 19);

/// Start date used when a K-data query leaves it empty.
pub const DEFAULT_START_DATE: &str = "2015-01-01";

/// Markets whose codes the server understands.
const MARKETS: [&str; 3] = ["sh", "sz", "bj"];

const DAILY_FIELDS: &[&str] = &[
    "date", "code", "open", "high", "low", "close", "preclose", "volume", "amount",
    "adjustflag", "turn", "tradestatus", "pctChg", "peTTM", "psTTM", "pcfNcfTTM", "pbMRQ",
    "isST",
];

const WEEKLY_MONTHLY_FIELDS: &[&str] = &[
    "date", "code", "open", "high", "low", "close", "volume", "amount", "adjustflag", "turn",
    "pctChg",
];

const INTRADAY_FIELDS: &[&str] = &[
    "date", "time", "code", "open", "high", "low", "close", "volume", "amount", "adjustflag",
];

/// A request refused locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: ErrorCode,
    pub message: String,
}

impl Rejection {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Checks login input.
pub fn credentials(creds: &Credentials) -> Result<(), Rejection> {
    if creds.user_id.is_empty() {
        return Err(Rejection::new(ErrorCode::EmptyUsername, "user id is empty"));
    }
    if creds.password.is_empty() {
        return Err(Rejection::new(ErrorCode::EmptyPassword, "password is empty"));
    }
    for value in [&creds.user_id, &creds.password, &creds.options] {
        check_value(value).map_err(|e| Rejection::new(e.code(), e.to_string()))?;
    }
    Ok(())
}

/// Normalizes and checks a security code such as `sh.600000`.
pub fn security_code(code: &str) -> Result<String, Rejection> {
    let code = code.trim().to_ascii_lowercase();
    if code.is_empty() {
        return Err(Rejection::new(
            ErrorCode::EmptyRequiredParameter,
            "security code is empty",
        ));
    }
    if code.len() != 9 || !code.is_ascii() || code.as_bytes()[2] != b'.' {
        return Err(Rejection::new(
            ErrorCode::InvalidSecurityCode,
            format!("security code {code:?} must look like sh.600000"),
        ));
    }
    if !MARKETS.contains(&&code[..2]) {
        return Err(Rejection::new(
            ErrorCode::UnsupportedCodeMarket,
            format!("market {:?} is not supported", &code[..2]),
        ));
    }
    if !code[3..].bytes().all(|b| b.is_ascii_digit()) {
        return Err(Rejection::new(
            ErrorCode::InvalidSecurityCode,
            format!("security code {code:?} must end in six digits"),
        ));
    }
    Ok(code)
}

/// Builds a dividend query from raw parameters. An empty `year_type` means
/// `report`.
pub fn dividend_query(code: &str, year: &str, year_type: &str) -> Result<Query, Rejection> {
    let code = security_code(code)?;
    let year_type = if year_type.is_empty() {
        YearType::default()
    } else {
        YearType::parse(year_type).ok_or_else(|| {
            Rejection::new(
                ErrorCode::InvalidParameter,
                format!("year type {year_type:?} must be report or operate"),
            )
        })?
    };

    let query = Query::Dividend(DividendQuery {
        code,
        year: year.trim().to_string(),
        year_type,
    });
    check_query(&query)?;
    Ok(query)
}

/// Builds a K-data query from raw parameters.
///
/// `fields` is comma separated. Empty `start_date`, `frequency` and
/// `adjust_flag` fall back to `2015-01-01`, daily and unadjusted; an empty
/// `end_date` is passed through and means "up to today".
pub fn k_data_query(
    code: &str,
    fields: &str,
    start_date: &str,
    end_date: &str,
    frequency: &str,
    adjust_flag: &str,
) -> Result<Query, Rejection> {
    let code = security_code(code)?;
    let frequency = if frequency.is_empty() {
        Frequency::default()
    } else {
        Frequency::parse(frequency).ok_or_else(|| {
            Rejection::new(
                ErrorCode::InvalidParameter,
                format!("frequency {frequency:?} must be one of d, w, m, 5, 15, 30, 60"),
            )
        })?
    };
    let adjust_flag = if adjust_flag.is_empty() {
        AdjustFlag::default()
    } else {
        AdjustFlag::parse(adjust_flag).ok_or_else(|| {
            Rejection::new(
                ErrorCode::InvalidParameter,
                format!("adjust flag {adjust_flag:?} must be 1, 2 or 3"),
            )
        })?
    };
    let start_date = match start_date.trim() {
        "" => DEFAULT_START_DATE.to_string(),
        s => s.to_string(),
    };

    let query = Query::KData(KDataQuery {
        code,
        fields: fields
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect(),
        start_date,
        end_date: end_date.trim().to_string(),
        frequency,
        adjust_flag,
    });
    check_query(&query)?;
    Ok(query)
}

/// Builds a query from its method name and `key=value` parameters.
pub fn query_from_params(name: &str, params: &[(&str, &str)]) -> Result<Query, Rejection> {
    let allowed: &[&str] = match name {
        Query::DIVIDEND_METHOD => &["code", "year", "yearType", "year_type"],
        Query::K_DATA_METHOD => &[
            "code",
            "fields",
            "start_date",
            "end_date",
            "frequency",
            "adjustflag",
            "adjust_flag",
        ],
        _ => {
            return Err(Rejection::new(
                ErrorCode::InvalidParameter,
                format!("unknown query {name:?}"),
            ));
        }
    };
    if let Some((key, _)) = params.iter().find(|(k, _)| !allowed.contains(k)) {
        return Err(Rejection::new(
            ErrorCode::InvalidParameter,
            format!("unknown parameter {key:?} for {name}"),
        ));
    }

    let get = |keys: &[&str]| {
        params
            .iter()
            .find(|(k, _)| keys.contains(k))
            .map(|(_, v)| *v)
            .unwrap_or("")
    };

    if name == Query::DIVIDEND_METHOD {
        dividend_query(get(&["code"]), get(&["year"]), get(&["yearType", "year_type"]))
    } else {
        k_data_query(
            get(&["code"]),
            get(&["fields"]),
            get(&["start_date"]),
            get(&["end_date"]),
            get(&["frequency"]),
            get(&["adjustflag", "adjust_flag"]),
        )
    }
}

/// Checks a fully built query.
pub fn check_query(query: &Query) -> Result<(), Rejection> {
    match query {
        Query::Dividend(q) => {
            security_code(&q.code)?;
            if q.year.is_empty() {
                return Err(Rejection::new(
                    ErrorCode::EmptyRequiredParameter,
                    "year is empty",
                ));
            }
            if q.year.len() != 4 || !q.year.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Rejection::new(
                    ErrorCode::InvalidParameter,
                    format!("year {:?} must be four digits", q.year),
                ));
            }
            Ok(())
        }
        Query::KData(q) => {
            security_code(&q.code)?;
            check_fields(&q.fields, q.frequency)?;
            check_dates(&q.start_date, &q.end_date)
        }
    }
}

fn check_fields(fields: &[String], frequency: Frequency) -> Result<(), Rejection> {
    if fields.is_empty() {
        return Err(Rejection::new(
            ErrorCode::EmptyRequiredParameter,
            "no fields requested",
        ));
    }

    let known = match frequency {
        Frequency::Daily => DAILY_FIELDS,
        Frequency::Weekly | Frequency::Monthly => WEEKLY_MONTHLY_FIELDS,
        _ => INTRADAY_FIELDS,
    };
    for (i, field) in fields.iter().enumerate() {
        check_value(field).map_err(|e| Rejection::new(e.code(), e.to_string()))?;
        if !known.contains(&field.as_str()) {
            return Err(Rejection::new(
                ErrorCode::InvalidIndicator,
                format!("field {field:?} is not available at frequency {}", frequency.as_str()),
            ));
        }
        if fields[..i].contains(field) {
            return Err(Rejection::new(
                ErrorCode::DuplicateIndicator,
                format!("field {field:?} requested twice"),
            ));
        }
    }
    Ok(())
}

fn check_dates(start: &str, end: &str) -> Result<(), Rejection> {
    let start_ymd = parse_date(start).ok_or_else(|| bad_date(start))?;
    if start_ymd < FIRST_TRADING_DAY {
        return Err(Rejection::new(
            ErrorCode::BeyondSupportedDateRange,
            format!("start date {start} is before the first trading day"),
        ));
    }
    if end.is_empty() {
        return Ok(());
    }
    let end_ymd = parse_date(end).ok_or_else(|| bad_date(end))?;
    if start_ymd > end_ymd {
        return Err(Rejection::new(
            ErrorCode::StartAfterEnd,
            format!("start date {start} is after end date {end}"),
        ));
    }
    Ok(())
}

fn bad_date(s: &str) -> Rejection {
    Rejection::new(
        ErrorCode::BadDateFormat,
        format!("date {s:?} is not in YYYY-MM-DD form"),
    )
}

/// Parses a `YYYY-MM-DD` calendar date.
fn parse_date(s: &str) -> Option<(u32, u32, u32)> {
    let b = s.as_bytes();
    if b.len() != 10 || !s.is_ascii() || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    let num = |part: &str| -> Option<u32> {
        if part.bytes().all(|c| c.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    let (y, m, d) = (num(&s[..4])?, num(&s[5..7])?, num(&s[8..])?);
    if !(1..=12).contains(&m) || d == 0 || d > days_in_month(y, m) {
        return None;
    }
    Some((y, m, d))
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(result: Result<impl std::fmt::Debug, Rejection>) -> ErrorCode {
        result.unwrap_err().code
    }

    #[test]
    fn security_codes() {
        assert_eq!(security_code("SH.600000").unwrap(), "sh.600000");
        assert_eq!(code_of(security_code("")), ErrorCode::EmptyRequiredParameter);
        assert_eq!(code_of(security_code("600000")), ErrorCode::InvalidSecurityCode);
        assert_eq!(code_of(security_code("sh.6000001")), ErrorCode::InvalidSecurityCode);
        assert_eq!(code_of(security_code("sh600000x")), ErrorCode::InvalidSecurityCode);
        assert_eq!(code_of(security_code("hk.000700")), ErrorCode::UnsupportedCodeMarket);
        assert_eq!(code_of(security_code("sz.00000a")), ErrorCode::InvalidSecurityCode);
        assert_eq!(code_of(security_code("sh.60000\u{4e00}")), ErrorCode::InvalidSecurityCode);
    }

    #[test]
    fn dividend_defaults_to_report() {
        let query = dividend_query("sh.600000", "2020", "").unwrap();
        let Query::Dividend(q) = query else {
            panic!("expected dividend query");
        };
        assert_eq!(q.year_type, YearType::Report);
    }

    #[test]
    fn dividend_rejections() {
        assert_eq!(
            code_of(dividend_query("sh.600000", "", "report")),
            ErrorCode::EmptyRequiredParameter
        );
        assert_eq!(
            code_of(dividend_query("sh.600000", "20x0", "report")),
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            code_of(dividend_query("sh.600000", "2020", "fiscal")),
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            code_of(dividend_query("sh.60000", "2020", "report")),
            ErrorCode::InvalidSecurityCode
        );
    }

    #[test]
    fn k_data_defaults() {
        let query = k_data_query("sz.000001", "date, close", "", "", "", "").unwrap();
        let Query::KData(q) = query else {
            panic!("expected k-data query");
        };
        assert_eq!(q.fields, ["date", "close"]);
        assert_eq!(q.start_date, DEFAULT_START_DATE);
        assert_eq!(q.end_date, "");
        assert_eq!(q.frequency, Frequency::Daily);
        assert_eq!(q.adjust_flag, AdjustFlag::None);
    }

    #[test]
    fn k_data_field_checks() {
        assert_eq!(
            code_of(k_data_query("sz.000001", "", "", "", "d", "3")),
            ErrorCode::EmptyRequiredParameter
        );
        assert_eq!(
            code_of(k_data_query("sz.000001", "date,date", "", "", "d", "3")),
            ErrorCode::DuplicateIndicator
        );
        assert_eq!(
            code_of(k_data_query("sz.000001", "date,peTTM", "", "", "w", "3")),
            ErrorCode::InvalidIndicator
        );
        assert!(k_data_query("sz.000001", "date,time,close", "", "", "5", "3").is_ok());
        assert_eq!(
            code_of(k_data_query("sz.000001", "date,time", "", "", "d", "3")),
            ErrorCode::InvalidIndicator
        );
    }

    #[test]
    fn k_data_date_checks() {
        let q = |start, end| k_data_query("sh.600000", "date", start, end, "d", "3");
        assert!(q("2020-01-01", "2020-12-31").is_ok());
        assert!(q("2020-02-29", "").is_ok());
        assert_eq!(code_of(q("2019-02-29", "")), ErrorCode::BadDateFormat);
        assert_eq!(code_of(q("2020/01/01", "")), ErrorCode::BadDateFormat);
        assert_eq!(code_of(q("2020-01-01", "2020-13-01")), ErrorCode::BadDateFormat);
        assert_eq!(code_of(q("2020-06-01", "2020-05-31")), ErrorCode::StartAfterEnd);
        assert_eq!(code_of(q("1990-12-18", "")), ErrorCode::BeyondSupportedDateRange);
        assert!(q("1990-12-19", "1990-12-19").is_ok());
    }

    #[test]
    fn k_data_enum_checks() {
        assert_eq!(
            code_of(k_data_query("sh.600000", "date", "", "", "y", "3")),
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            code_of(k_data_query("sh.600000", "date", "", "", "d", "0")),
            ErrorCode::InvalidParameter
        );
    }

    #[test]
    fn named_parameters() {
        let query = query_from_params(
            "query_dividend_data",
            &[("code", "sh.600000"), ("year", "2020"), ("yearType", "operate")],
        )
        .unwrap();
        assert_eq!(
            query,
            Query::Dividend(DividendQuery {
                code: "sh.600000".into(),
                year: "2020".into(),
                year_type: YearType::Operate,
            })
        );

        assert_eq!(
            code_of(query_from_params("query_everything", &[])),
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            code_of(query_from_params(
                "query_dividend_data",
                &[("code", "sh.600000"), ("colour", "red")]
            )),
            ErrorCode::InvalidParameter
        );
    }

    #[test]
    fn credential_checks() {
        assert!(credentials(&Credentials::anonymous()).is_ok());
        assert_eq!(
            code_of(credentials(&Credentials::new("", "pw"))),
            ErrorCode::EmptyUsername
        );
        assert_eq!(
            code_of(credentials(&Credentials::new("user", ""))),
            ErrorCode::EmptyPassword
        );
        assert_eq!(
            code_of(credentials(&Credentials::new("user", "p\x01w"))),
            ErrorCode::InvalidParameter
        );
    }
}
