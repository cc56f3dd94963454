//! Parsing of Junos `| display json` replies.
//!
//! Junos renders every element as an array of objects and every leaf as
//! `[{"data": "<value>"}]`. Chassis-cluster replies wrap the payload in
//! `multi-routing-engine-results/multi-routing-engine-item`; per-node
//! results are concatenated.

use serde_json::Value;
use thiserror::Error;

use crate::device::{AssociationRecord, AssociationTable, SessionRecord, SessionTable};

const SESSION_ROOT: &str = "flow-session-information";
const SESSION_COUNT: &str = "displayed-session-count";
const SESSION: &str = "flow-session";
const SESSION_WING: &str = "flow-information";

const SA_ROOT: &str = "ipsec-security-associations-information";
const SA_BLOCK: &str = "ipsec-security-associations-block";
const SA_ENTRY: &str = "ipsec-security-associations";
const SA_GATEWAY: &str = "sa-remote-gateway";
const SA_INDEX: &str = "sa-tunnel-index";

const CLUSTER_RESULTS: &str = "multi-routing-engine-results";
const CLUSTER_ITEM: &str = "multi-routing-engine-item";

/// Errors from reply parsing.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing element `{0}`")]
    Missing(&'static str),

    #[error("`{element}` is not a count: {value:?}")]
    InvalidCount {
        element: &'static str,
        value: String,
    },

    #[error("security association #{position} has no `{element}`")]
    IncompleteAssociation {
        position: usize,
        element: &'static str,
    },
}

/// Parse the reply to `show security flow session protocol <p>`.
pub fn parse_session_table(json: &str) -> Result<SessionTable, ReplyError> {
    let root: Value = serde_json::from_str(json)?;
    let blocks = payload(&root, SESSION_ROOT);
    if blocks.is_empty() {
        return Err(ReplyError::Missing(SESSION_ROOT));
    }

    let mut table = SessionTable::default();
    for block in blocks {
        let raw = leaf(block, SESSION_COUNT).ok_or(ReplyError::Missing(SESSION_COUNT))?;
        let count: u64 = raw.parse().map_err(|_| ReplyError::InvalidCount {
            element: SESSION_COUNT,
            value: raw.to_string(),
        })?;
        table.displayed_session_count += count;

        table.sessions.extend(children(block, SESSION).map(|session| SessionRecord {
            peer: inbound_source(session),
        }));
    }

    Ok(table)
}

/// Parse the reply to `show security ipsec security-associations`.
pub fn parse_association_table(json: &str) -> Result<AssociationTable, ReplyError> {
    let root: Value = serde_json::from_str(json)?;
    let infos = payload(&root, SA_ROOT);
    if infos.is_empty() {
        return Err(ReplyError::Missing(SA_ROOT));
    }

    let entries = infos
        .into_iter()
        .flat_map(|info| children(info, SA_BLOCK))
        .flat_map(|block| children(block, SA_ENTRY));

    let mut table = AssociationTable::default();
    for (i, entry) in entries.enumerate() {
        let position = i + 1;
        let gateway = leaf(entry, SA_GATEWAY).ok_or(ReplyError::IncompleteAssociation {
            position,
            element: SA_GATEWAY,
        })?;
        let index = leaf(entry, SA_INDEX).ok_or(ReplyError::IncompleteAssociation {
            position,
            element: SA_INDEX,
        })?;
        table
            .associations
            .push(AssociationRecord::new(gateway, index));
    }

    Ok(table)
}

/// Top-level payload elements, looking through the cluster wrapper if present.
fn payload<'a>(root: &'a Value, name: &str) -> Vec<&'a Value> {
    let direct: Vec<&Value> = children(root, name).collect();
    if !direct.is_empty() {
        return direct;
    }

    children(root, CLUSTER_RESULTS)
        .flat_map(|results| children(results, CLUSTER_ITEM))
        .flat_map(|item| children(item, name))
        .collect()
}

fn children<'a>(node: &'a Value, name: &str) -> std::slice::Iter<'a, Value> {
    match node.get(name) {
        Some(Value::Array(items)) => items.iter(),
        Some(other) => std::slice::from_ref(other).iter(),
        None => (&[] as &[Value]).iter(),
    }
}

/// Trimmed text of the first `name` leaf; blank values count as absent.
fn leaf<'a>(node: &'a Value, name: &str) -> Option<&'a str> {
    let value = children(node, name).next()?;
    let text = match value {
        Value::String(s) => s.as_str(),
        other => other.get("data")?.as_str()?,
    };
    Some(text.trim()).filter(|t| !t.is_empty())
}

/// Source address of the inbound wing, falling back to the first wing.
fn inbound_source(session: &Value) -> Option<String> {
    let wings: Vec<&Value> = children(session, SESSION_WING).collect();
    let inbound = wings
        .iter()
        .find(|wing| leaf(wing, "direction").is_some_and(|d| d.eq_ignore_ascii_case("in")))
        .or_else(|| wings.first());

    inbound
        .and_then(|wing| leaf(wing, "source-address"))
        .map(str::to_string)
}
