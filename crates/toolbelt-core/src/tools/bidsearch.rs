//! Jianyu bid search tools
//!
//! Three local tools over the Jianyu bid data HTTP API:
//!
//! - `bid_list`: filtered bid listing for one keyword set
//! - `bid_detail`: one bid by id
//! - `bid_radar`: several keywords over a time window, paged and deduplicated
//!
//! `bidsearch` requires the `jianyu_appid` and `jianyu_key` credentials; a
//! context without them reports the tool disabled and yields no tools.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::spec::{ToolBuilder, ToolSpec};
use crate::config::Settings;
use crate::error::{ToolError, ToolResult};
use crate::types::{FunctionTool, SharedTool};

pub const TOOL_NAME: &str = "bidsearch";

pub const APPID_CREDENTIAL: &str = "jianyu_appid";
pub const KEY_CREDENTIAL: &str = "jianyu_key";

const DEFAULT_SCOPE: &str = "公告标题,公告正文,标的物,项目名称";
const DEFAULT_SUBTYPES: &str = "拟建,采购意向,预告,预审,预审结果,论证意见,需求公示,招标,询价,竞谈,\
单一,竞价,变更,邀标,成交,中标,废标,流标,结果变更,合同,违规,验收,其它";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SECONDS_PER_DAY: i64 = 86_400;

/// Callable spec for the built-in catalog
pub(crate) fn spec() -> ToolSpec {
    ToolSpec::callable(TOOL_NAME, ToolBuilder::configured(build_tools))
        .requires_credentials([APPID_CREDENTIAL, KEY_CREDENTIAL])
        .with_description("Bid search: listing, detail and multi-keyword radar scans")
        .with_tags(["bidding", "jianyu"])
}

/// Build the three tools against the client the settings describe
pub fn build_tools(settings: &Settings) -> ToolResult<Vec<SharedTool>> {
    let client = match JianyuClient::from_settings(settings)? {
        Some(client) => client,
        None => return Ok(Vec::new()),
    };

    let list_client = client.clone();
    let bid_list = FunctionTool::new_async(
        "bid_list",
        "Search bid announcements by keyword, region and other filters",
        move |args: Value| {
            let client = list_client.clone();
            async move {
                let args: BidListArgs = parse_args("bid_list", args)?;
                Ok(client.bid_list(args.into_filters(chrono::Utc::now().timestamp())).await)
            }
        },
    )
    .with_schema(json!({
        "type": "object",
        "properties": {
            "keyword": {"type": "string", "description": "Keywords, comma separated"},
            "days": {"type": "integer", "default": 7},
            "area": {"type": "string"},
            "buyerclass": {"type": "string"},
            "industry": {"type": "string"},
            "page": {"type": "integer", "default": 1},
            "size": {"type": "integer", "default": 20},
            "keywordScope": {"type": "string"},
            "subType": {"type": "string"}
        },
        "required": ["keyword"]
    }));

    let detail_client = client.clone();
    let bid_detail = FunctionTool::new_async("bid_detail", "Fetch one bid announcement by id", move |args: Value| {
        let client = detail_client.clone();
        async move {
            let args: BidDetailArgs = parse_args("bid_detail", args)?;
            Ok(client.bid_info(&args.bid_id).await)
        }
    })
    .with_schema(json!({
        "type": "object",
        "properties": {"bid_id": {"type": "string"}},
        "required": ["bid_id"]
    }));

    let radar_client = client;
    let bid_radar = FunctionTool::new_async(
        "bid_radar",
        "Scan several keywords over recent days, deduplicating bids",
        move |args: Value| {
            let client = radar_client.clone();
            async move {
                let args: BidRadarArgs = parse_args("bid_radar", args)?;
                Ok(client.radar(args, chrono::Utc::now().timestamp()).await)
            }
        },
    )
    .with_schema(json!({
        "type": "object",
        "properties": {
            "keywords": {
                "oneOf": [
                    {"type": "string"},
                    {"type": "array", "items": {"type": "string"}}
                ]
            },
            "days": {"type": "integer", "default": 7},
            "maxItems": {"type": "integer"},
            "dedupe": {"type": "boolean", "default": true}
        },
        "required": ["keywords"]
    }));

    Ok(vec![bid_list.shared(), bid_detail.shared(), bid_radar.shared()])
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> ToolResult<T> {
    serde_json::from_value(args).map_err(|e| ToolError::invocation(tool, format!("invalid arguments: {}", e)))
}

/// Signed client for the Jianyu bid data API
#[derive(Clone)]
pub struct JianyuClient {
    appid: String,
    key: String,
    base_url: String,
    http: reqwest::Client,
}

impl JianyuClient {
    pub fn new(appid: impl Into<String>, key: impl Into<String>, base_url: impl Into<String>) -> ToolResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ToolError::invalid_spec(TOOL_NAME, format!("http client: {}", e)))?;
        Ok(Self {
            appid: appid.into(),
            key: key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// `None` when either credential is missing
    pub fn from_settings(settings: &Settings) -> ToolResult<Option<Self>> {
        match (settings.credential(APPID_CREDENTIAL), settings.credential(KEY_CREDENTIAL)) {
            (Some(appid), Some(key)) => Self::new(appid, key, settings.jianyu_base_url()).map(Some),
            _ => Ok(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upper-case hex MD5 of appid, timestamp and key
    pub fn token(appid: &str, key: &str, timestamp: i64) -> String {
        format!("{:X}", md5::compute(format!("{}{}{}", appid, timestamp, key)))
    }

    fn signed(&self, mut payload: Map<String, Value>) -> Map<String, Value> {
        let timestamp = chrono::Utc::now().timestamp();
        payload.insert("appid".into(), json!(self.appid));
        payload.insert("token".into(), json!(Self::token(&self.appid, &self.key, timestamp)));
        payload.insert("timestamp".into(), json!(timestamp.to_string()));
        payload.insert("key".into(), json!(self.key));
        payload
    }

    /// POST to the API; failures come back as a `code: -1` response body
    async fn post(&self, path: &str, payload: Map<String, Value>) -> Value {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let result = async {
            self.http
                .post(&url)
                .header("Content-Type", "application/json;charset=utf-8")
                .json(&self.signed(payload))
                .send()
                .await?
                .error_for_status()?
                .json::<Value>()
                .await
        }
        .await;

        result.unwrap_or_else(|e| failure(format!("request failed: {}", e)))
    }

    pub async fn bid_list(&self, filters: Map<String, Value>) -> Value {
        self.post("list", filters).await
    }

    pub async fn bid_info(&self, bid_id: &str) -> Value {
        let mut payload = Map::new();
        payload.insert("id".into(), json!(bid_id));
        self.post("info", payload).await
    }

    async fn radar(&self, args: BidRadarArgs, now: i64) -> Value {
        let keywords = args.keywords.normalized();
        if keywords.is_empty() {
            return json!({
                "success": false,
                "message": "at least one keyword is required",
                "data": [],
                "total": 0,
            });
        }

        let (start, end) = time_range(args.days, now);
        let mut collector = RadarCollector::new(args.dedupe, args.max_items);

        'keywords: for keyword in &keywords {
            let mut next: Option<String> = None;
            loop {
                let mut payload = Map::new();
                payload.insert("keyword".into(), json!(keyword));
                payload.insert("keywordScope".into(), json!(DEFAULT_SCOPE));
                payload.insert("subType".into(), json!(DEFAULT_SUBTYPES));
                payload.insert("publishtimeStart".into(), json!(start));
                payload.insert("publishtimeEnd".into(), json!(end));
                if let Some(token) = &next {
                    payload.insert("next".into(), json!(token));
                }

                let response = self.bid_list(payload).await;
                let page = match page_records(&response) {
                    Some(page) if !page.is_empty() => page,
                    _ => break,
                };
                if collector.extend(keyword, page) {
                    break 'keywords;
                }

                next = response
                    .get("next")
                    .and_then(Value::as_str)
                    .filter(|token| !token.is_empty())
                    .map(str::to_string);
                if next.is_none() {
                    break;
                }
            }
        }

        let results = collector.into_results();
        json!({
            "success": true,
            "message": format!("fetched {} record(s)", results.len()),
            "total": results.len(),
            "data": results,
            "keywords": keywords,
            "days": args.days,
            "deduped": args.dedupe,
        })
    }
}

fn failure(message: String) -> Value {
    json!({"code": -1, "msg": message, "data": [], "count": 0})
}

/// Records of a successful list response
fn page_records(response: &Value) -> Option<&Vec<Value>> {
    let code = response.get("code").and_then(Value::as_i64).unwrap_or(0);
    if code != 0 {
        return None;
    }
    response.get("data").and_then(Value::as_array)
}

/// Publish window ending at `now`, at least one day long
fn time_range(days: i64, now: i64) -> (i64, i64) {
    (now - days.max(1) * SECONDS_PER_DAY, now)
}

fn default_days() -> i64 {
    7
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    20
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct BidListArgs {
    keyword: String,
    #[serde(default = "default_days")]
    days: i64,
    area: Option<String>,
    buyerclass: Option<String>,
    industry: Option<String>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_size")]
    size: u32,
    #[serde(rename = "keywordScope")]
    keyword_scope: Option<String>,
    #[serde(rename = "subType")]
    sub_type: Option<String>,
}

impl BidListArgs {
    fn into_filters(self, now: i64) -> Map<String, Value> {
        let (start, end) = time_range(self.days, now);
        let mut filters = Map::new();
        filters.insert("keyword".into(), json!(self.keyword));
        filters.insert(
            "keywordScope".into(),
            json!(self.keyword_scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string())),
        );
        filters.insert(
            "subType".into(),
            json!(self.sub_type.unwrap_or_else(|| DEFAULT_SUBTYPES.to_string())),
        );
        filters.insert("publishtimeStart".into(), json!(start));
        filters.insert("publishtimeEnd".into(), json!(end));
        filters.insert("page".into(), json!(self.page));
        filters.insert("size".into(), json!(self.size));
        for (field, value) in [
            ("area", self.area),
            ("buyerclass", self.buyerclass),
            ("industry", self.industry),
        ] {
            if let Some(value) = value {
                filters.insert(field.into(), json!(value));
            }
        }
        filters
    }
}

#[derive(Debug, Deserialize)]
struct BidDetailArgs {
    bid_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Keywords {
    Joined(String),
    List(Vec<String>),
}

impl Keywords {
    /// Trimmed, non-empty keywords; a string is split on commas
    fn normalized(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Keywords::Joined(joined) => joined.split(',').collect(),
            Keywords::List(list) => list.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct BidRadarArgs {
    keywords: Keywords,
    #[serde(default = "default_days")]
    days: i64,
    #[serde(rename = "maxItems")]
    max_items: Option<usize>,
    #[serde(default = "default_true")]
    dedupe: bool,
}

/// Accumulates radar pages across keywords
struct RadarCollector {
    dedupe: bool,
    max_items: Option<usize>,
    seen: HashSet<String>,
    results: Vec<Value>,
}

impl RadarCollector {
    fn new(dedupe: bool, max_items: Option<usize>) -> Self {
        Self {
            dedupe,
            max_items: max_items.filter(|max| *max > 0),
            seen: HashSet::new(),
            results: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.max_items.is_some_and(|max| self.results.len() >= max)
    }

    /// Add one page tagged with its keyword; true once the limit is reached
    fn extend(&mut self, keyword: &str, page: &[Value]) -> bool {
        for item in page {
            if self.is_full() {
                break;
            }
            if self.dedupe {
                if let Some(id) = item.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) {
                    if !self.seen.insert(id.to_string()) {
                        continue;
                    }
                }
            }
            let mut record = item.clone();
            if let Some(fields) = record.as_object_mut() {
                fields.insert("search_keyword".into(), json!(keyword));
            }
            self.results.push(record);
        }
        self.is_full()
    }

    fn into_results(self) -> Vec<Value> {
        self.results
    }
}
