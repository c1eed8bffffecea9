//! Terms service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::terms::{
        data::Terms, errors::TermsServiceError, repository::SqliteTermsRepository,
    },
    settings::Settings,
};

#[derive(Debug, Clone)]
pub struct SqliteTermsService {
    db: Db,
    settings: Arc<Settings>,
    repository: SqliteTermsRepository,
}

impl SqliteTermsService {
    #[must_use]
    pub fn new(db: Db, settings: Arc<Settings>) -> Self {
        Self {
            db,
            settings,
            repository: SqliteTermsRepository::new(),
        }
    }

    fn terms_ref(&self) -> &Terms {
        &self.settings.terms
    }
}

#[async_trait]
impl TermsService for SqliteTermsService {
    fn terms(&self) -> Terms {
        self.terms_ref().clone()
    }

    async fn record_agreement(
        &self,
        user_id: &str,
        urls: Vec<String>,
    ) -> Result<bool, TermsServiceError> {
        let published = self.terms_ref().url_set();

        let mut unknown: Vec<String> = urls
            .iter()
            .filter(|url| !published.contains(url.as_str()))
            .cloned()
            .collect();

        if !unknown.is_empty() {
            unknown.sort_unstable();
            unknown.dedup();

            return Err(TermsServiceError::UnrecognisedTerms(unknown));
        }

        let mut tx = self.db.begin().await?;

        self.repository
            .add_agreed_urls(&mut tx, user_id, &urls)
            .await?;

        let sufficient = self.refresh_consent(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(sufficient)
    }

    async fn is_sufficient(&self, user_id: &str) -> Result<bool, TermsServiceError> {
        let mut tx = self.db.begin().await?;

        let sufficient = self.refresh_consent(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(sufficient)
    }
}

impl SqliteTermsService {
    async fn refresh_consent(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        user_id: &str,
    ) -> Result<bool, TermsServiceError> {
        let agreed = self.repository.list_agreed_urls(tx, user_id).await?;

        let terms = self.terms_ref();

        if !terms.is_sufficient(&agreed) {
            return Ok(false);
        }

        if let Some(version) = terms.master_version()
            && self
                .repository
                .set_consent_version(tx, user_id, version)
                .await?
        {
            info!(user_id, consent_version = version, "account consented to terms");
        }

        Ok(true)
    }
}

#[automock]
#[async_trait]
pub trait TermsService: Send + Sync {
    /// Currently published terms.
    fn terms(&self) -> Terms;

    /// Record that `user_id` agreed to `urls`.
    ///
    /// Returns whether the account's agreements are now sufficient.
    async fn record_agreement(
        &self,
        user_id: &str,
        urls: Vec<String>,
    ) -> Result<bool, TermsServiceError>;

    /// Whether `user_id` has agreed to every published document.
    async fn is_sufficient(&self, user_id: &str) -> Result<bool, TermsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::create_account};

    use super::*;

    const YAML: &str = r"
master_version: v2
docs:
  privacy:
    version: '1'
    langs:
      en: { name: Privacy, url: url1 }
  tos:
    version: '2'
    langs:
      en: { name: Terms, url: url2 }
      de: { name: Bedingungen, url: url2-de }
";

    async fn context() -> Result<TestContext, Box<dyn std::error::Error>> {
        Ok(TestContext::builder().terms(Terms::from_yaml(YAML)?).build().await)
    }

    #[tokio::test]
    async fn partial_agreement_is_not_sufficient() -> TestResult {
        let ctx = context().await?;

        create_account(&ctx, "@alice:example.org").await?;

        let sufficient = ctx
            .terms
            .record_agreement("@alice:example.org", vec!["url1".to_string()])
            .await?;

        assert!(!sufficient);
        assert!(!ctx.terms.is_sufficient("@alice:example.org").await?);
        assert_eq!(ctx.consent_version("@alice:example.org").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn completing_agreement_updates_consent_version() -> TestResult {
        let ctx = context().await?;

        create_account(&ctx, "@alice:example.org").await?;

        ctx.terms
            .record_agreement("@alice:example.org", vec!["url1".to_string()])
            .await?;

        let sufficient = ctx
            .terms
            .record_agreement("@alice:example.org", vec!["url2".to_string()])
            .await?;

        assert!(sufficient);
        assert!(ctx.terms.is_sufficient("@alice:example.org").await?);
        assert_eq!(
            ctx.consent_version("@alice:example.org").await?.as_deref(),
            Some("v2")
        );

        Ok(())
    }

    #[tokio::test]
    async fn any_language_satisfies_a_document() -> TestResult {
        let ctx = context().await?;

        create_account(&ctx, "@alice:example.org").await?;

        let sufficient = ctx
            .terms
            .record_agreement(
                "@alice:example.org",
                vec!["url1".to_string(), "url2-de".to_string()],
            )
            .await?;

        assert!(sufficient);

        Ok(())
    }

    #[tokio::test]
    async fn agreeing_twice_is_idempotent() -> TestResult {
        let ctx = context().await?;
        let urls = vec!["url1".to_string(), "url2".to_string()];

        create_account(&ctx, "@alice:example.org").await?;

        let first = ctx
            .terms
            .record_agreement("@alice:example.org", urls.clone())
            .await?;

        let second = ctx
            .terms
            .record_agreement("@alice:example.org", urls)
            .await?;

        let rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM accepted_terms_urls WHERE user_id = ?1")
                .bind("@alice:example.org")
                .fetch_one(ctx.db.pool())
                .await?;

        assert_eq!(first, second);
        assert_eq!(rows, 2);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_urls_are_rejected_without_recording() -> TestResult {
        let ctx = context().await?;

        create_account(&ctx, "@alice:example.org").await?;

        let result = ctx
            .terms
            .record_agreement(
                "@alice:example.org",
                vec!["url1".to_string(), "https://evil.example".to_string()],
            )
            .await;

        assert!(
            matches!(
                &result,
                Err(TermsServiceError::UnrecognisedTerms(unknown))
                    if unknown == &["https://evil.example".to_string()]
            ),
            "expected UnrecognisedTerms, got {result:?}"
        );

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accepted_terms_urls")
            .fetch_one(ctx.db.pool())
            .await?;

        assert_eq!(rows, 0);

        Ok(())
    }

    #[tokio::test]
    async fn master_version_change_is_picked_up() -> TestResult {
        let ctx = context().await?;

        create_account(&ctx, "@alice:example.org").await?;

        sqlx::query("UPDATE accounts SET consent_version = 'v1' WHERE user_id = ?1")
            .bind("@alice:example.org")
            .execute(ctx.db.pool())
            .await?;

        ctx.terms
            .record_agreement("@alice:example.org", vec!["url1".to_string()])
            .await?;

        assert_eq!(
            ctx.consent_version("@alice:example.org").await?.as_deref(),
            Some("v1")
        );

        ctx.terms
            .record_agreement("@alice:example.org", vec!["url2".to_string()])
            .await?;

        assert_eq!(
            ctx.consent_version("@alice:example.org").await?.as_deref(),
            Some("v2")
        );

        Ok(())
    }

    #[tokio::test]
    async fn no_terms_is_always_sufficient() -> TestResult {
        let ctx = TestContext::new().await;

        create_account(&ctx, "@alice:example.org").await?;

        assert!(ctx.terms.is_sufficient("@alice:example.org").await?);
        assert_eq!(ctx.consent_version("@alice:example.org").await?, None);

        Ok(())
    }
}
