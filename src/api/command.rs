use crate::engine::{Domain, ListOp, TrackerEngine, UserList};
use thiserror::Error;

/// The closed set of mutations the UI surface may issue. Only the two user
/// lists are mutable here; the static blocklist and the learned set are
/// read-only views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddWhitelist(Domain),
    RemoveWhitelist(Domain),
    AddBlacklist(Domain),
    RemoveBlacklist(Domain),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown or immutable list: {0:?}")]
    UnknownList(String),
    #[error("unknown operation: {0:?}")]
    UnknownOp(String),
    #[error("not a valid domain: {0:?}")]
    InvalidDomain(String),
}

impl Command {
    /// Maps the wire triple (list, op, domain) into a typed command.
    pub fn from_parts(list: &str, op: &str, domain: &str) -> Result<Self, CommandError> {
        if !matches!(list, "whitelist" | "blacklist") {
            return Err(CommandError::UnknownList(list.to_string()));
        }
        if !matches!(op, "add" | "remove") {
            return Err(CommandError::UnknownOp(op.to_string()));
        }
        let domain =
            Domain::parse(domain).map_err(|e| CommandError::InvalidDomain(e.0))?;

        Ok(match (list, op) {
            ("whitelist", "add") => Command::AddWhitelist(domain),
            ("whitelist", "remove") => Command::RemoveWhitelist(domain),
            ("blacklist", "add") => Command::AddBlacklist(domain),
            _ => Command::RemoveBlacklist(domain),
        })
    }

    /// Runs the mutation. Returns whether state changed; duplicates and
    /// absent removals are silent no-ops either way.
    pub async fn apply(self, engine: &TrackerEngine) -> bool {
        match self {
            Command::AddWhitelist(d) => engine.mutate(UserList::Whitelist, ListOp::Add, d).await,
            Command::RemoveWhitelist(d) => {
                engine.mutate(UserList::Whitelist, ListOp::Remove, d).await
            }
            Command::AddBlacklist(d) => engine.mutate(UserList::Blacklist, ListOp::Add, d).await,
            Command::RemoveBlacklist(d) => {
                engine.mutate(UserList::Blacklist, ListOp::Remove, d).await
            }
        }
    }
}
