//! AWS credential resolution.
//!
//! Sources are tried in a fixed order and the first complete key pair wins:
//! 1. environment variables, when `use_env_credentials` is on
//! 2. the explicit key fields, when either one is set
//! 3. the named profile in the shared credentials file
//! 4. the default chain: environment, `AWS_PROFILE` or `[default]`, a web
//!    identity token, container credentials, then EC2 instance metadata

use crate::config::{AwsCredentialsConfig, EnvSnapshot, expand_path};
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const IMDS_ENDPOINT: &str = "http://169.254.169.254";
const IMDS_TOKEN_HEADER: &str = "x-aws-ec2-metadata-token";
const IMDS_TOKEN_TTL_HEADER: &str = "x-aws-ec2-metadata-token-ttl-seconds";
const CONTAINER_ENDPOINT: &str = "http://169.254.170.2";
const STS_ENDPOINT: &str = "https://sts.amazonaws.com";
const METADATA_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl AwsCredentials {
    fn from_parts(access: Option<&str>, secret: Option<&str>, token: Option<&str>) -> Option<Self> {
        let access = access.map(str::trim).filter(|s| !s.is_empty())?;
        let secret = secret.map(str::trim).filter(|s| !s.is_empty())?;
        Some(Self {
            access_key_id: access.to_string(),
            secret_access_key: secret.to_string(),
            session_token: token.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Explicit,
    Profile(String),
    DefaultChain,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => f.write_str("environment variables"),
            Self::Explicit => f.write_str("explicit inputs"),
            Self::Profile(name) => write!(f, "profile '{name}'"),
            Self::DefaultChain => f.write_str("default credentials chain"),
        }
    }
}

/// Ordered credential sources over a fixed environment snapshot.
#[derive(Debug, Clone)]
pub struct CredentialChain {
    sources: Vec<CredentialSource>,
    config: AwsCredentialsConfig,
    env: EnvSnapshot,
}

impl CredentialChain {
    pub fn from_config(config: &AwsCredentialsConfig, env: &EnvSnapshot) -> Self {
        let mut sources = Vec::new();
        if config.use_env_credentials {
            sources.push(CredentialSource::Environment);
        } else if config.access_key_id.is_some() || config.secret_access_key.is_some() {
            sources.push(CredentialSource::Explicit);
        }
        if let Some(profile) = config.profile.as_deref().filter(|p| !p.trim().is_empty()) {
            sources.push(CredentialSource::Profile(profile.trim().to_string()));
        }
        sources.push(CredentialSource::DefaultChain);
        Self {
            sources,
            config: config.clone(),
            env: env.clone(),
        }
    }

    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }

    /// First source that yields a complete key pair.
    pub fn resolve(&self) -> anyhow::Result<(CredentialSource, AwsCredentials)> {
        for source in &self.sources {
            match self.try_source(source)? {
                Some(creds) => {
                    info!("Using AWS credentials from {source}");
                    return Ok((source.clone(), creds));
                }
                None => debug!("No AWS credentials from {source}"),
            }
        }
        anyhow::bail!(
            "No AWS credentials found (tried: {})",
            self.sources
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }

    fn try_source(&self, source: &CredentialSource) -> anyhow::Result<Option<AwsCredentials>> {
        Ok(match source {
            CredentialSource::Environment => self.from_env(),
            CredentialSource::Explicit => AwsCredentials::from_parts(
                self.config.access_key_id.as_deref(),
                self.config.secret_access_key.as_deref(),
                self.config.session_token.as_deref(),
            ),
            CredentialSource::Profile(name) => self.from_profile(name)?,
            CredentialSource::DefaultChain => self.from_default_chain()?,
        })
    }

    fn from_default_chain(&self) -> anyhow::Result<Option<AwsCredentials>> {
        if let Some(creds) = self.from_env() {
            return Ok(Some(creds));
        }
        let profile = self.env.get("AWS_PROFILE").unwrap_or("default");
        if let Some(creds) = self.from_profile(profile)? {
            return Ok(Some(creds));
        }
        if let Some(creds) = self.from_web_identity()? {
            debug!("Default chain resolved a web identity role");
            return Ok(Some(creds));
        }
        if let Some(creds) = self.from_container()? {
            debug!("Default chain resolved container credentials");
            return Ok(Some(creds));
        }
        Ok(self.from_instance_metadata())
    }

    fn from_env(&self) -> Option<AwsCredentials> {
        AwsCredentials::from_parts(
            self.env.get("AWS_ACCESS_KEY_ID"),
            self.env.get("AWS_SECRET_ACCESS_KEY"),
            self.env.get("AWS_SESSION_TOKEN"),
        )
    }

    fn credentials_file(&self) -> Option<PathBuf> {
        if let Some(path) = self.env.get("AWS_SHARED_CREDENTIALS_FILE") {
            return Some(expand_path(path));
        }
        self.env.home().map(|home| home.join(".aws").join("credentials"))
    }

    fn from_profile(&self, name: &str) -> anyhow::Result<Option<AwsCredentials>> {
        let Some(path) = self.credentials_file() else {
            return Ok(None);
        };
        if !path.exists() {
            debug!("No shared credentials file at {}", path.display());
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let profiles = parse_credentials_file(&raw);
        Ok(profiles.get(name).and_then(|p| {
            AwsCredentials::from_parts(
                p.get("aws_access_key_id").map(String::as_str),
                p.get("aws_secret_access_key").map(String::as_str),
                p.get("aws_session_token").map(String::as_str),
            )
        }))
    }
}

/// Credential document served by the container and instance metadata endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetadataCredentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
}

impl MetadataCredentials {
    fn into_credentials(self) -> Option<AwsCredentials> {
        AwsCredentials::from_parts(
            Some(&self.access_key_id),
            Some(&self.secret_access_key),
            self.token.as_deref(),
        )
    }
}

fn metadata_client() -> anyhow::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .connect_timeout(METADATA_CONNECT_TIMEOUT)
        .timeout(METADATA_TIMEOUT)
        .build()
        .context("failed to build credentials HTTP client")
}

impl CredentialChain {
    /// `AssumeRoleWithWebIdentity` with the token file named by
    /// `AWS_WEB_IDENTITY_TOKEN_FILE` (EKS service accounts).
    fn from_web_identity(&self) -> anyhow::Result<Option<AwsCredentials>> {
        let (Some(token_file), Some(role_arn)) = (
            self.env.get("AWS_WEB_IDENTITY_TOKEN_FILE"),
            self.env.get("AWS_ROLE_ARN"),
        ) else {
            return Ok(None);
        };
        let token = std::fs::read_to_string(expand_path(token_file))
            .with_context(|| format!("cannot read web identity token {token_file}"))?;
        let session_name = self.env.get("AWS_ROLE_SESSION_NAME").unwrap_or("oraflow");
        let endpoint = self.env.get("AWS_ENDPOINT_URL_STS").unwrap_or(STS_ENDPOINT);

        let resp = metadata_client()?
            .get(format!("{}/", endpoint.trim_end_matches('/')))
            .query(&[
                ("Action", "AssumeRoleWithWebIdentity"),
                ("Version", "2011-06-15"),
                ("RoleArn", role_arn),
                ("RoleSessionName", session_name),
                ("WebIdentityToken", token.trim()),
            ])
            .send()
            .context("AssumeRoleWithWebIdentity request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed to read STS response")?;
        anyhow::ensure!(status.is_success(), "AssumeRoleWithWebIdentity returned {status}: {body}");
        Ok(AwsCredentials::from_parts(
            xml_text(&body, "AccessKeyId"),
            xml_text(&body, "SecretAccessKey"),
            xml_text(&body, "SessionToken"),
        ))
    }

    /// ECS / EKS Pod Identity credentials endpoint.
    fn from_container(&self) -> anyhow::Result<Option<AwsCredentials>> {
        let url = match (
            self.env.get("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI"),
            self.env.get("AWS_CONTAINER_CREDENTIALS_FULL_URI"),
        ) {
            (Some(relative), _) => format!("{CONTAINER_ENDPOINT}{relative}"),
            (None, Some(full)) => full.to_string(),
            (None, None) => return Ok(None),
        };
        let auth = match self.env.get("AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE") {
            Some(path) => Some(
                std::fs::read_to_string(expand_path(path))
                    .with_context(|| format!("cannot read container authorization token {path}"))?
                    .trim()
                    .to_string(),
            ),
            None => self.env.get("AWS_CONTAINER_AUTHORIZATION_TOKEN").map(String::from),
        };

        let mut request = metadata_client()?.get(&url);
        if let Some(auth) = auth {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        let creds: MetadataCredentials = request
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("container credentials request to {url} failed"))?
            .json()
            .context("unexpected container credentials response")?;
        Ok(creds.into_credentials())
    }

    /// EC2 instance profile through IMDSv2. An unreachable endpoint means
    /// "not on EC2" and yields nothing.
    fn from_instance_metadata(&self) -> Option<AwsCredentials> {
        if self
            .env
            .get("AWS_EC2_METADATA_DISABLED")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return None;
        }
        let endpoint = self
            .env
            .get("AWS_EC2_METADATA_SERVICE_ENDPOINT")
            .unwrap_or(IMDS_ENDPOINT)
            .trim_end_matches('/');
        match fetch_instance_credentials(endpoint) {
            Ok(creds) => creds,
            Err(e) => {
                debug!("Instance metadata credentials unavailable: {e:#}");
                None
            }
        }
    }
}

fn fetch_instance_credentials(endpoint: &str) -> anyhow::Result<Option<AwsCredentials>> {
    let client = metadata_client()?;
    let token = client
        .put(format!("{endpoint}/latest/api/token"))
        .header(IMDS_TOKEN_TTL_HEADER, "21600")
        .send()?
        .error_for_status()?
        .text()?;

    let base = format!("{endpoint}/latest/meta-data/iam/security-credentials/");
    let roles = client
        .get(&base)
        .header(IMDS_TOKEN_HEADER, &token)
        .send()?
        .error_for_status()?
        .text()?;
    let Some(role) = roles.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(None);
    };

    let creds: MetadataCredentials = client
        .get(format!("{base}{role}"))
        .header(IMDS_TOKEN_HEADER, &token)
        .send()?
        .error_for_status()?
        .json()?;
    Ok(creds.into_credentials())
}

/// Text of the first `<tag>...</tag>` element in an XML document.
fn xml_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let start = xml.find(&open)? + open.len();
    let len = xml[start..].find(&format!("</{tag}>"))?;
    Some(&xml[start..start + len])
}

/// Parse the INI-style shared credentials file into profile -> key -> value.
pub fn parse_credentials_file(raw: &str) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut profiles: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut current: Option<String> = None;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = section.trim();
            // ~/.aws/config style headers
            let name = name.strip_prefix("profile ").unwrap_or(name).trim();
            profiles.entry(name.to_string()).or_default();
            current = Some(name.to_string());
            continue;
        }
        if let (Some(profile), Some((key, value))) = (&current, line.split_once('=')) {
            profiles
                .entry(profile.clone())
                .or_default()
                .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "
# shared credentials
[default]
aws_access_key_id = AKIDDEFAULT
aws_secret_access_key = defaultsecret

[work]
aws_access_key_id=AKIDWORK
aws_secret_access_key=worksecret
aws_session_token=worktoken
";

    fn config() -> AwsCredentialsConfig {
        AwsCredentialsConfig {
            use_env_credentials: false,
            ..AwsCredentialsConfig::default()
        }
    }

    fn env_with_file(dir: &tempfile::TempDir, extra: &[(&str, &str)]) -> EnvSnapshot {
        let path = dir.path().join("credentials");
        std::fs::write(&path, FILE).unwrap();
        let mut pairs: Vec<(String, String)> = vec![(
            "AWS_SHARED_CREDENTIALS_FILE".into(),
            path.to_string_lossy().into_owned(),
        )];
        pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        EnvSnapshot::from_pairs(pairs)
    }

    #[test]
    fn parses_profiles() {
        let profiles = parse_credentials_file(FILE);
        assert_eq!(profiles["default"]["aws_access_key_id"], "AKIDDEFAULT");
        assert_eq!(profiles["work"]["aws_session_token"], "worktoken");
    }

    #[test]
    fn environment_mode_comes_first() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with_file(
            &dir,
            &[("AWS_ACCESS_KEY_ID", "AKIDENV"), ("AWS_SECRET_ACCESS_KEY", "envsecret")],
        );
        let mut cfg = config();
        cfg.use_env_credentials = true;
        cfg.profile = Some("work".into());
        let (source, creds) = CredentialChain::from_config(&cfg, &env).resolve().unwrap();
        assert_eq!(source, CredentialSource::Environment);
        assert_eq!(creds.access_key_id, "AKIDENV");
    }

    #[test]
    fn explicit_inputs_beat_profile() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with_file(&dir, &[]);
        let mut cfg = config();
        cfg.access_key_id = Some("AKIDINPUT".into());
        cfg.secret_access_key = Some("inputsecret".into());
        cfg.profile = Some("work".into());
        let chain = CredentialChain::from_config(&cfg, &env);
        assert_eq!(
            chain.sources(),
            [
                CredentialSource::Explicit,
                CredentialSource::Profile("work".into()),
                CredentialSource::DefaultChain
            ]
        );
        let (source, creds) = chain.resolve().unwrap();
        assert_eq!(source, CredentialSource::Explicit);
        assert_eq!(creds.access_key_id, "AKIDINPUT");
    }

    #[test]
    fn half_explicit_pair_falls_through_to_profile() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with_file(&dir, &[]);
        let mut cfg = config();
        cfg.access_key_id = Some("AKIDINPUT".into());
        cfg.profile = Some("work".into());
        let (source, creds) = CredentialChain::from_config(&cfg, &env).resolve().unwrap();
        assert_eq!(source, CredentialSource::Profile("work".into()));
        assert_eq!(creds.session_token.as_deref(), Some("worktoken"));
    }

    #[test]
    fn default_chain_reads_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with_file(&dir, &[]);
        let (source, creds) = CredentialChain::from_config(&config(), &env).resolve().unwrap();
        assert_eq!(source, CredentialSource::DefaultChain);
        assert_eq!(creds.access_key_id, "AKIDDEFAULT");
    }

    fn no_instance_metadata() -> EnvSnapshot {
        EnvSnapshot::from_pairs([("AWS_EC2_METADATA_DISABLED", "true")])
    }

    #[test]
    fn nothing_found_is_an_error() {
        let err = CredentialChain::from_config(&config(), &no_instance_metadata())
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("No AWS credentials found"));
    }

    #[test]
    fn debug_hides_the_secret() {
        let creds = AwsCredentials::from_parts(Some("AKID"), Some("shh"), Some("tok")).unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("AKID"));
        assert!(!shown.contains("shh"));
        assert!(!shown.contains("tok"));
    }

    mod metadata {
        use super::*;
        use wiremock::matchers::{header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        async fn resolve_blocking(env: EnvSnapshot) -> anyhow::Result<(CredentialSource, AwsCredentials)> {
            tokio::task::spawn_blocking(move || CredentialChain::from_config(&config(), &env).resolve())
                .await
                .unwrap()
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn container_endpoint_with_authorization_token() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/v2/credentials/abc"))
                .and(header("authorization", "container-token"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "AccessKeyId": "ASIACONTAINER",
                    "SecretAccessKey": "containersecret",
                    "Token": "containertoken",
                    "Expiration": "2030-01-01T00:00:00Z"
                })))
                .expect(1)
                .mount(&server)
                .await;

            let env = EnvSnapshot::from_pairs([
                ("AWS_CONTAINER_CREDENTIALS_FULL_URI", format!("{}/v2/credentials/abc", server.uri())),
                ("AWS_CONTAINER_AUTHORIZATION_TOKEN", "container-token".to_string()),
                ("AWS_EC2_METADATA_DISABLED", "true".to_string()),
            ]);
            let (source, creds) = resolve_blocking(env).await.unwrap();
            assert_eq!(source, CredentialSource::DefaultChain);
            assert_eq!(creds.access_key_id, "ASIACONTAINER");
            assert_eq!(creds.session_token.as_deref(), Some("containertoken"));
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn container_endpoint_failure_is_reported() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let env = EnvSnapshot::from_pairs([
                ("AWS_CONTAINER_CREDENTIALS_FULL_URI", format!("{}/creds", server.uri())),
                ("AWS_EC2_METADATA_DISABLED", "true".to_string()),
            ]);
            let err = resolve_blocking(env).await.unwrap_err();
            assert!(format!("{err:#}").contains("container credentials"), "{err:#}");
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn instance_profile_through_imds_v2() {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .and(path("/latest/api/token"))
                .and(header(IMDS_TOKEN_TTL_HEADER, "21600"))
                .respond_with(ResponseTemplate::new(200).set_body_string("imds-session"))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/latest/meta-data/iam/security-credentials/"))
                .and(header(IMDS_TOKEN_HEADER, "imds-session"))
                .respond_with(ResponseTemplate::new(200).set_body_string("app-role\n"))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/latest/meta-data/iam/security-credentials/app-role"))
                .and(header(IMDS_TOKEN_HEADER, "imds-session"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "Code": "Success",
                    "Type": "AWS-HMAC",
                    "AccessKeyId": "ASIAINSTANCE",
                    "SecretAccessKey": "instancesecret",
                    "Token": "instancetoken"
                })))
                .mount(&server)
                .await;

            let env = EnvSnapshot::from_pairs([("AWS_EC2_METADATA_SERVICE_ENDPOINT", server.uri())]);
            let (source, creds) = resolve_blocking(env).await.unwrap();
            assert_eq!(source, CredentialSource::DefaultChain);
            assert_eq!(creds.access_key_id, "ASIAINSTANCE");
            assert_eq!(creds.session_token.as_deref(), Some("instancetoken"));
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn instance_without_role_yields_nothing() {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .and(path("/latest/api/token"))
                .respond_with(ResponseTemplate::new(200).set_body_string("imds-session"))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;

            let env = EnvSnapshot::from_pairs([("AWS_EC2_METADATA_SERVICE_ENDPOINT", server.uri())]);
            let err = resolve_blocking(env).await.unwrap_err();
            assert!(err.to_string().contains("No AWS credentials found"));
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn web_identity_assumes_the_role() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/"))
                .and(query_param("Action", "AssumeRoleWithWebIdentity"))
                .and(query_param("RoleArn", "arn:aws:iam::123456789012:role/bedrock"))
                .and(query_param("WebIdentityToken", "jwt-token"))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    "<AssumeRoleWithWebIdentityResponse><AssumeRoleWithWebIdentityResult><Credentials>\
                     <AccessKeyId>ASIAWEBID</AccessKeyId><SecretAccessKey>webidsecret</SecretAccessKey>\
                     <SessionToken>webidtoken</SessionToken></Credentials></AssumeRoleWithWebIdentityResult>\
                     </AssumeRoleWithWebIdentityResponse>",
                ))
                .expect(1)
                .mount(&server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let token_file = dir.path().join("token");
            std::fs::write(&token_file, "jwt-token\n").unwrap();
            let env = EnvSnapshot::from_pairs([
                ("AWS_WEB_IDENTITY_TOKEN_FILE", token_file.to_string_lossy().into_owned()),
                ("AWS_ROLE_ARN", "arn:aws:iam::123456789012:role/bedrock".to_string()),
                ("AWS_ENDPOINT_URL_STS", server.uri()),
                ("AWS_EC2_METADATA_DISABLED", "true".to_string()),
            ]);
            let (_, creds) = resolve_blocking(env).await.unwrap();
            assert_eq!(creds.access_key_id, "ASIAWEBID");
            assert_eq!(creds.secret_access_key, "webidsecret");
            assert_eq!(creds.session_token.as_deref(), Some("webidtoken"));
        }

        #[test]
        fn xml_text_extracts_elements() {
            let xml = "<a><AccessKeyId>AK</AccessKeyId><Empty></Empty></a>";
            assert_eq!(xml_text(xml, "AccessKeyId"), Some("AK"));
            assert_eq!(xml_text(xml, "Empty"), Some(""));
            assert_eq!(xml_text(xml, "Missing"), None);
        }
    }
}
