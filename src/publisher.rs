use anyhow::{bail, Result};
use rand::Rng;
use sha1::{Digest, Sha1};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::netlify::{CreateSiteError, HostingProvider, Site};
use crate::slug;

/// The single artifact of every deploy.
const INDEX_PATH: &str = "/index.html";

/// Bounded retry for site-name allocation. A provider-reported name
/// collision is the only retried error; there is no backoff between
/// attempts.
#[derive(Debug, Clone, Copy)]
pub struct NameAllocPolicy {
    pub max_attempts: u32,
}

impl Default for NameAllocPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

/// Fixed-interval readiness polling. Exhausting the budget is not a
/// failure; the deploy may still complete after we stop watching.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 15,
        }
    }
}

pub struct PublishOutcome {
    pub site_id: String,
    pub url: String,
    pub deploy_id: String,
}

fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn random_suffix() -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

/// Create a hosting site named after `desired_name`, retrying with a short
/// random suffix while the provider reports the name as taken. Any other
/// provider error is fatal on first occurrence.
pub async fn allocate_site<P: HostingProvider>(
    provider: &P,
    desired_name: &str,
    policy: NameAllocPolicy,
) -> Result<Site> {
    let base = slug::sanitize(desired_name);

    // Suffixed retries must still fit the provider's length limit.
    let mut suffix_base = base.clone();
    suffix_base.truncate(slug::MAX_SLUG_LEN - 5);
    while suffix_base.ends_with('-') {
        suffix_base.pop();
    }

    let mut attempt_name = base.clone();
    for attempt in 1..=policy.max_attempts {
        match provider.create_site(&attempt_name).await {
            Ok(site) => {
                info!(
                    "Allocated site {} ({}) on attempt {}",
                    site.name, site.id, attempt
                );
                return Ok(site);
            }
            Err(CreateSiteError::NameTaken) => {
                debug!("Site name {} is taken, retrying with a suffix", attempt_name);
                attempt_name = format!("{}-{}", suffix_base, random_suffix());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context("Failed to create hosting site"))
            }
        }
    }

    bail!("Could not find an available site name")
}

/// Watch the deploy until it goes live or fails. Returns the URL to hand
/// back to the caller: the deploy's live URL when it settles within the
/// budget, otherwise the provisional site URL. A deploy in the error state
/// aborts immediately.
pub async fn await_live<P: HostingProvider>(
    provider: &P,
    deploy_id: &str,
    provisional_url: &str,
    policy: PollPolicy,
) -> Result<String> {
    for _ in 0..policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        let deploy = match provider.get_deploy(deploy_id).await {
            Ok(deploy) => deploy,
            Err(e) => {
                // A failed status read burns an attempt but does not abort.
                warn!("Failed to fetch deploy {} status: {:#}", deploy_id, e);
                continue;
            }
        };

        if deploy.state.is_live() {
            let url = deploy
                .live_url
                .unwrap_or_else(|| provisional_url.to_string());
            debug!("Deploy {} is live at {}", deploy_id, url);
            return Ok(url);
        }
        if deploy.state.is_failed() {
            bail!("Deploy failed on the hosting provider");
        }
    }

    debug!(
        "Deploy {} still pending after {} polls, returning provisional URL",
        deploy_id, policy.max_attempts
    );
    Ok(provisional_url.to_string())
}

/// The whole publish protocol: resolve the hosting site (reuse an existing
/// id, or allocate a name), open a digest deploy for the HTML, upload the
/// bytes only if the provider is missing them, then wait (bounded) for the
/// deploy to go live. Republishing identical content never re-uploads.
pub async fn publish<P: HostingProvider>(
    provider: &P,
    html: &str,
    site_name: Option<&str>,
    existing_site_id: Option<&str>,
    alloc_policy: NameAllocPolicy,
    poll_policy: PollPolicy,
) -> Result<PublishOutcome> {
    let site = match existing_site_id {
        Some(id) => match provider.get_site(id).await {
            Ok(site) => site,
            // The id is caller-supplied and sufficient to deploy; a failed
            // info lookup only costs us the provisional URL.
            Err(e) => {
                warn!("Failed to look up site {}: {:#}", id, e);
                Site {
                    id: id.to_string(),
                    name: String::new(),
                    url: String::new(),
                }
            }
        },
        None => allocate_site(provider, site_name.unwrap_or(""), alloc_policy).await?,
    };

    let digest = sha1_hex(html.as_bytes());
    let deploy = provider.create_deploy(&site.id, INDEX_PATH, &digest).await?;

    if deploy.required.iter().any(|d| d == &digest) {
        provider
            .upload_file(&deploy.id, INDEX_PATH, html.as_bytes().to_vec())
            .await?;
    } else {
        debug!("Provider already has digest {}, skipping upload", digest);
    }

    let url = await_live(provider, &deploy.id, &site.url, poll_policy).await?;

    Ok(PublishOutcome {
        site_id: site.id,
        url,
        deploy_id: deploy.id,
    })
}
