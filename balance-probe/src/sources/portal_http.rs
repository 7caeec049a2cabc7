use std::time::Duration;

use anyhow::Context;
use balance_client::domain::Account;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tokio::sync::OnceCell;

use crate::{
    config::{AccountsConfig, PortalConfig},
    pipeline::{PageSource, ProbeError},
};

/// Fetches account payment pages from the prepaid portal.
///
/// The portal only serves the payment pages to a session that visited its
/// landing pages first, so the client keeps a cookie store and walks the
/// bootstrap URLs once before the first account request.
pub struct PortalHttpSource {
    client: reqwest::Client,
    bootstrap_urls: Vec<String>,
    accounts: AccountsConfig,
    session: OnceCell<()>,
}

impl PortalHttpSource {
    pub fn new(portal: &PortalConfig, accounts: &AccountsConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(default_headers(portal)?)
            .user_agent(portal.user_agent.as_str())
            .timeout(Duration::from_secs(portal.timeout_secs))
            .build()
            .context("failed to build portal HTTP client")?;

        Ok(Self {
            client,
            bootstrap_urls: portal.bootstrap_urls.clone(),
            accounts: accounts.clone(),
            session: OnceCell::new(),
        })
    }

    /// Visit the landing pages so the portal sets its cookies.
    ///
    /// Landing page statuses are ignored; only network failures are errors.
    async fn bootstrap(&self, account: Account) -> Result<(), ProbeError> {
        for url in &self.bootstrap_urls {
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ProbeError::Transport {
                    account,
                    message: format!("session bootstrap via {url} failed: {e}"),
                })?;
            tracing::debug!(%url, status = resp.status().as_u16(), "bootstrap page visited");
        }
        Ok(())
    }
}

fn default_headers(portal: &PortalConfig) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_str(&portal.accept).context("invalid accept header")?,
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_str(&portal.accept_language)
            .context("invalid accept_language header")?,
    );
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    if let Some(referer) = &portal.referer {
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(referer).context("invalid referer header")?,
        );
    }
    Ok(headers)
}

#[async_trait::async_trait]
impl PageSource for PortalHttpSource {
    async fn fetch_page(&self, account: Account) -> Result<String, ProbeError> {
        self.session
            .get_or_try_init(|| self.bootstrap(account))
            .await?;

        let url = self.accounts.url(account);
        let transport = |e: reqwest::Error| ProbeError::Transport {
            account,
            message: e.to_string(),
        };

        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            metrics::counter!("portal_http_errors_total", "account" => account.as_str())
                .increment(1);
            return Err(ProbeError::Transport {
                account,
                message: format!("{url} answered {status}"),
            });
        }

        resp.text().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, Request, ResponseTemplate,
    };

    fn configs(server: &MockServer) -> (PortalConfig, AccountsConfig) {
        let portal = PortalConfig {
            bootstrap_urls: vec![
                format!("{}/", server.uri()),
                format!("{}/nat/", server.uri()),
            ],
            timeout_secs: 5,
            referer: Some(format!("{}/", server.uri())),
            ..PortalConfig::default()
        };
        let accounts = AccountsConfig {
            water: format!("{}/nat/pay.aspx?mid=1", server.uri()),
            electric: format!("{}/nat/pay.aspx?mid=2", server.uri()),
        };
        (portal, accounts)
    }

    #[tokio::test]
    async fn bootstraps_session_once_and_sends_its_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "ASP.NET_SessionId=abc; Path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/nat/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/nat/pay.aspx"))
            .and(header("cookie", "ASP.NET_SessionId=abc"))
            .and(|req: &Request| {
                // `header()` splits values on commas, so compare the raw value.
                req.headers.get("accept-language").map(|v| v.as_bytes())
                    == Some(b"zh-CN,zh;q=0.9".as_slice())
            })
            .and(query_param("mid", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("water page"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/nat/pay.aspx"))
            .and(header("cookie", "ASP.NET_SessionId=abc"))
            .and(query_param("mid", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("electric page"))
            .expect(1)
            .mount(&server)
            .await;

        let (portal, accounts) = configs(&server);
        let source = PortalHttpSource::new(&portal, &accounts).unwrap();

        let (water, electric) = tokio::try_join!(
            source.fetch_page(Account::Water),
            source.fetch_page(Account::Electric)
        )
        .unwrap();

        assert_eq!(water, "water page");
        assert_eq!(electric, "electric page");
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nat/pay.aspx"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (mut portal, accounts) = configs(&server);
        portal.bootstrap_urls.clear();
        let source = PortalHttpSource::new(&portal, &accounts).unwrap();

        let err = source.fetch_page(Account::Electric).await.unwrap_err();
        match err {
            ProbeError::Transport { account, message } => {
                assert_eq!(account, Account::Electric);
                assert!(message.contains("503"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_bootstrap_is_a_transport_error() {
        let (mut portal, accounts) = (PortalConfig::default(), AccountsConfig::default());
        // Nothing listens on the discard port.
        portal.bootstrap_urls = vec!["http://127.0.0.1:9/".to_string()];
        portal.timeout_secs = 2;
        let source = PortalHttpSource::new(&portal, &accounts).unwrap();

        let err = source.fetch_page(Account::Water).await.unwrap_err();
        assert!(err.to_string().contains("session bootstrap"));
    }
}
