//! Wire types exchanged with proctord.
//!
//! `Metadata` mirrors the entries of `GET /jobs/metadata`; `ToExecute` is both
//! the body of `POST /jobs/execute` and the shape of its response (where
//! `name` carries the execution handle).

use serde::{Deserialize, Serialize};

use crate::execution::args::ArgumentMap;

/// Name + human description of a single documented variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Variables a proc expects: plain args supplied by the user and secrets
/// injected server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVars {
    #[serde(default)]
    pub secrets: Vec<EnvVarMetadata>,
    #[serde(default)]
    pub args: Vec<EnvVarMetadata>,
}

/// Documentation of a proc as published by proctord.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub env_vars: EnvVars,
    #[serde(default)]
    pub authorized_groups: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub contributors: String,
    #[serde(default)]
    pub organization: String,
}

/// Execution request / response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToExecute {
    pub name: String,
    #[serde(default)]
    pub args: ArgumentMap,
}

/// Find a proc by exact name. When the list carries duplicates the last one
/// wins, matching how proctord overwrites metadata on re-registration.
pub fn find_by_name<'a>(procs: &'a [Metadata], name: &str) -> Option<&'a Metadata> {
    procs.iter().rev().find(|p| p.name == name)
}
