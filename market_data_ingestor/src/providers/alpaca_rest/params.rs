use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::{
    models::{
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

/// Specifies the source feed for stock data.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

/// Specifies the sort order for the bars.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

/// Alpaca-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AlpacaBarsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Adjustment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

fn query_value<T: Serialize>(v: &T) -> Option<String> {
    match serde_json::to_value(v).ok()? {
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Checks the amount/unit combinations Alpaca accepts.
pub fn validate_timeframe(tf: &TimeFrame) -> Result<(), ProviderError> {
    let ok = match tf.unit {
        TimeFrameUnit::Minute => (1..=59).contains(&tf.amount),
        TimeFrameUnit::Hour => (1..=23).contains(&tf.amount),
        TimeFrameUnit::Day | TimeFrameUnit::Week => tf.amount == 1,
        TimeFrameUnit::Month => [1, 2, 3, 6, 12].contains(&tf.amount),
    };
    if ok {
        Ok(())
    } else {
        ValidationSnafu {
            message: format!("Alpaca does not support a {tf} timeframe"),
        }
        .fail()
    }
}

/// Alpaca's spelling of a timeframe (`15Min`, `1Hour`, `1Day`, ...).
pub fn alpaca_timeframe(tf: &TimeFrame) -> String {
    let unit = match tf.unit {
        TimeFrameUnit::Minute => "Min",
        TimeFrameUnit::Hour => "Hour",
        TimeFrameUnit::Day => "Day",
        TimeFrameUnit::Week => "Week",
        TimeFrameUnit::Month => "Month",
    };
    format!("{}{unit}", tf.amount)
}

/// Builds the query string for one page of `/v2/stocks/bars`.
pub fn construct_params(params: &BarsRequestParams) -> Vec<(String, String)> {
    let mut q = vec![
        ("symbols".to_string(), params.symbols.join(",")),
        ("timeframe".to_string(), alpaca_timeframe(&params.timeframe)),
        (
            "start".to_string(),
            params.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "end".to_string(),
            params.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];

    if let ProviderParams::Alpaca(extra) = &params.provider_specific {
        let optional = [
            ("adjustment", extra.adjustment.as_ref().and_then(query_value)),
            ("feed", extra.feed.as_ref().and_then(query_value)),
            ("currency", extra.currency.clone()),
            ("limit", extra.limit.map(|l| l.to_string())),
            ("sort", extra.sort.as_ref().and_then(query_value)),
        ];
        q.extend(
            optional
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k.to_string(), v))),
        );
    }
    q
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::asset::AssetClass;

    fn request(provider_specific: ProviderParams) -> BarsRequestParams {
        BarsRequestParams {
            symbols: vec!["AAPL".into(), "MSFT".into()],
            timeframe: TimeFrame::day(),
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            asset_class: AssetClass::UsEquity,
            provider_specific,
        }
    }

    fn get<'a>(q: &'a [(String, String)], key: &str) -> Option<&'a str> {
        q.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn base_query_has_symbols_timeframe_and_range() {
        let q = construct_params(&request(ProviderParams::None));
        assert_eq!(get(&q, "symbols"), Some("AAPL,MSFT"));
        assert_eq!(get(&q, "timeframe"), Some("1Day"));
        assert_eq!(get(&q, "start"), Some("2024-01-01T00:00:00Z"));
        assert_eq!(get(&q, "end"), Some("2025-01-01T00:00:00Z"));
        assert_eq!(q.len(), 4);
    }

    #[test]
    fn alpaca_extras_are_snake_case() {
        let q = construct_params(&request(ProviderParams::Alpaca(AlpacaBarsParams {
            adjustment: Some(Adjustment::Split),
            feed: Some(Feed::Iex),
            limit: Some(500),
            sort: Some(Sort::Desc),
            ..Default::default()
        })));
        assert_eq!(get(&q, "adjustment"), Some("split"));
        assert_eq!(get(&q, "feed"), Some("iex"));
        assert_eq!(get(&q, "limit"), Some("500"));
        assert_eq!(get(&q, "sort"), Some("desc"));
        assert_eq!(get(&q, "currency"), None);
    }

    #[test]
    fn timeframe_rules() {
        assert!(validate_timeframe(&TimeFrame::new(15, TimeFrameUnit::Minute)).is_ok());
        assert!(validate_timeframe(&TimeFrame::new(60, TimeFrameUnit::Minute)).is_err());
        assert!(validate_timeframe(&TimeFrame::new(24, TimeFrameUnit::Hour)).is_err());
        assert!(validate_timeframe(&TimeFrame::new(2, TimeFrameUnit::Day)).is_err());
        assert!(validate_timeframe(&TimeFrame::new(2, TimeFrameUnit::Week)).is_err());
        assert!(validate_timeframe(&TimeFrame::new(6, TimeFrameUnit::Month)).is_ok());
        assert!(validate_timeframe(&TimeFrame::new(4, TimeFrameUnit::Month)).is_err());
        assert_eq!(alpaca_timeframe(&TimeFrame::new(15, TimeFrameUnit::Minute)), "15Min");
    }
}
