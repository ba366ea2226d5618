//! OpenShift CLI cluster client
//!
//! Implements the ClusterClient trait by running the `oc` binary and
//! decoding its JSON and `--output=name` output.

use crate::cluster::client::{BuildHandle, BuildOptions, BuildStatus, ClusterClient};
use crate::cluster::error_tail;
use crate::config::schema::ClusterConfig;
use crate::error::{BcschedError, BcschedResult};
use crate::resource::{flatten, ResourceIdentity};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Cluster client backed by the `oc` command-line tool
pub struct OcClient {
    binary: String,
    global_args: Vec<String>,
    namespace: String,
}

impl OcClient {
    /// Create a client, resolving the default namespace.
    ///
    /// `namespace` wins over `config.namespace`; when neither is set the
    /// current project of the logged-in `oc` session is used.
    pub async fn connect(config: &ClusterConfig, namespace: Option<String>) -> BcschedResult<Self> {
        let mut global_args = Vec::new();
        if let Some(ref context) = config.context {
            global_args.push(format!("--context={}", context));
        }
        if let Some(ref server) = config.server {
            global_args.push(format!("--server={}", server));
        }

        let mut client = Self {
            binary: config.oc_binary.clone(),
            global_args,
            namespace: String::new(),
        };

        client.namespace = match namespace.or_else(|| config.namespace.clone()) {
            Some(ns) => ns,
            None => client.current_project().await?,
        };
        debug!("Using namespace {}", client.namespace);

        Ok(client)
    }

    /// Ask `oc` for the current project
    async fn current_project(&self) -> BcschedResult<String> {
        let output = self.exec(&["project", "--short"]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BcschedError::command_exec("oc project --short", stderr));
        }
        let project = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if project.is_empty() {
            return Err(BcschedError::User(
                "No current project; pass --namespace or set cluster.namespace".to_string(),
            ));
        }
        Ok(project)
    }

    /// Execute an `oc` command and return the output
    async fn exec(&self, args: &[&str]) -> BcschedResult<std::process::Output> {
        debug!("Executing: {} {:?} {:?}", self.binary, self.global_args, args);

        Command::new(&self.binary)
            .args(&self.global_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BcschedError::OcNotFound {
                        binary: self.binary.clone(),
                    }
                } else {
                    BcschedError::command_failed(format!("{} {:?}", self.binary, args), e)
                }
            })
    }

    /// `oc get` every identity of one namespace in a single call
    async fn get_namespace(
        &self,
        namespace: &str,
        identities: &[&ResourceIdentity],
    ) -> BcschedResult<Vec<Value>> {
        let ns_arg = format!("--namespace={}", namespace);
        let names: Vec<String> = identities.iter().map(|id| id.short_name()).collect();

        let mut args = vec![ns_arg.as_str(), "get"];
        args.extend(names.iter().map(String::as_str));
        args.push("--output=json");

        let output = self.exec(&args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            // Partial misses still print the objects that were found
            if !is_not_found(&stderr) {
                return Err(BcschedError::command_exec(
                    format!("oc get {}", names.join(" ")),
                    stderr,
                ));
            }
            debug!("Some objects not found in {}: {}", namespace, stderr.trim());
        }

        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        let document: Value = serde_json::from_str(&stdout)?;
        Ok(flatten(document))
    }
}

#[async_trait]
impl ClusterClient for OcClient {
    fn default_namespace(&self) -> &str {
        &self.namespace
    }

    async fn fetch_objects(&self, identities: &[ResourceIdentity]) -> BcschedResult<Vec<Value>> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        // `oc get` takes one namespace per call
        let mut groups: Vec<(&str, Vec<&ResourceIdentity>)> = Vec::new();
        for id in identities {
            match groups.iter_mut().find(|(ns, _)| *ns == id.namespace()) {
                Some((_, members)) => members.push(id),
                None => groups.push((id.namespace(), vec![id])),
            }
        }

        let fetched = try_join_all(
            groups
                .iter()
                .map(|(ns, members)| self.get_namespace(ns, members)),
        )
        .await?;

        let mut by_identity: HashMap<ResourceIdentity, Value> = HashMap::new();
        for body in fetched.into_iter().flatten() {
            let identity = ResourceIdentity::from_body(&body, &self.namespace)?;
            by_identity.insert(identity, body);
        }

        Ok(identities
            .iter()
            .filter_map(|id| by_identity.remove(id))
            .collect())
    }

    async fn start_build(
        &self,
        build_config: &ResourceIdentity,
        options: BuildOptions,
    ) -> BcschedResult<BuildHandle> {
        info!("Starting build of {}", build_config);

        let ns_arg = format!("--namespace={}", build_config.namespace());
        let name = build_config.short_name();
        let wait_arg = format!("--wait={}", options.wait);
        let output = self
            .exec(&[
                ns_arg.as_str(),
                "start-build",
                name.as_str(),
                wait_arg.as_str(),
                "--output=name",
            ])
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let identifiers = parse_name_output(&stdout, build_config.namespace());

        if output.status.success() {
            return Ok(BuildHandle {
                identifiers,
                status: BuildStatus::Complete,
            });
        }

        if identifiers.is_empty() {
            return Err(BcschedError::command_exec(
                format!("oc start-build {}", name),
                stderr,
            ));
        }

        Ok(BuildHandle {
            identifiers,
            status: BuildStatus::Failed {
                phase: "Failed".to_string(),
                message: Some(error_tail(&stdout, &stderr)),
            },
        })
    }

    fn client_name(&self) -> &'static str {
        "OpenShift CLI"
    }
}

/// Parse `--output=name` lines (`Build/app-1`, `build.build.openshift.io/app-1`)
fn parse_name_output(stdout: &str, namespace: &str) -> Vec<ResourceIdentity> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match ResourceIdentity::parse(line, namespace) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring unexpected oc output line: {}", line);
                None
            }
        })
        .collect()
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("NotFound") || stderr.contains("not found")
}
