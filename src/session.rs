use crate::api::{GenerateRequest, SalesSettings};
use crate::client::ApiClient;
use crate::composite::{CompositeResult, OverlayFont, composite};
use crate::config::PipelineConfig;
use crate::error::{PortraitError, PortraitResult};
use crate::model::{CreditState, PlayerMetadata, Sport};
use crate::normalize::{NormalizeOptions, normalize, source_data_uri};

/// Outcome of the client-side credit gate. A UX short-circuit only; the
/// server remains the enforcement authority for credit consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    /// Authenticated with a known-empty balance; route to purchase instead
    /// of attempting the network call.
    NeedsPurchase,
}

/// Session-scoped pipeline state: settings, credit mirror, credential and
/// overlay font, loaded once at startup and passed explicitly, no ambient
/// singletons. One generation pipeline runs per session at a time.
pub struct Session {
    config: PipelineConfig,
    client: ApiClient,
    settings: Option<SalesSettings>,
    credits: Option<CreditState>,
    token: Option<String>,
    font: Option<OverlayFont>,
    loaded: bool,
}

impl Session {
    pub fn new(config: PipelineConfig) -> PortraitResult<Self> {
        config.validate()?;
        let client = ApiClient::new(&config.api_base)?;
        let font = match &config.font_path {
            Some(path) => Some(OverlayFont::load(path)?),
            None => OverlayFont::locate(),
        };
        Ok(Self {
            config,
            client,
            settings: None,
            credits: None,
            token: None,
            font,
            loaded: false,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn settings(&self) -> Option<&SalesSettings> {
        self.settings.as_ref()
    }

    pub fn credits(&self) -> Option<CreditState> {
        self.credits
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Seed the advisory credit mirror, e.g. from a cached session. The
    /// remote value loaded via [`Session::load`] supersedes it.
    pub fn set_credits(&mut self, credits: CreditState) {
        self.credits = Some(credits);
    }

    /// Load-once-at-startup lifecycle: fetch settings, and the credit
    /// balance when a credential is present. Subsequent calls are no-ops.
    pub async fn load(&mut self) -> PortraitResult<()> {
        if self.loaded {
            return Ok(());
        }
        self.settings = Some(self.client.settings().await?);
        if let Some(token) = self.token.clone() {
            self.credits = Some(self.client.credits(&token).await?);
        }
        self.loaded = true;
        Ok(())
    }

    pub async fn refresh_credits(&mut self) -> PortraitResult<()> {
        if let Some(token) = self.token.clone() {
            self.credits = Some(self.client.credits(&token).await?);
        }
        Ok(())
    }

    /// Whether a generation attempt is permitted right now. Unauthenticated
    /// sessions (and sessions whose balance is unknown) pass through: the
    /// server answers with the authoritative error itself.
    pub fn gate(&self) -> GateDecision {
        match (&self.token, self.credits) {
            (Some(_), Some(credits)) if !credits.any_remaining() => GateDecision::NeedsPurchase,
            _ => GateDecision::Allowed,
        }
    }

    /// Run the whole pipeline for one photo: validate → gate → normalize
    /// (degrading to the original bytes if the photo does not decode) →
    /// generate → fetch payload → composite (fail-closed).
    ///
    /// Normalization always completes before the generation request is
    /// issued, and compositing only runs after a successful response.
    #[tracing::instrument(skip_all, fields(sport = %sport))]
    pub async fn create_portrait(
        &mut self,
        photo: &[u8],
        meta: &PlayerMetadata,
        sport: Sport,
    ) -> PortraitResult<CompositeResult> {
        meta.validate()?;
        if let Some(settings) = &self.settings
            && !settings.enabled().contains(&sport)
        {
            return Err(PortraitError::validation(format!(
                "sport '{sport}' is not currently enabled"
            )));
        }
        if self.gate() == GateDecision::NeedsPurchase {
            return Err(PortraitError::CreditsExhausted);
        }

        let payload = match normalize(photo, &NormalizeOptions::from(&self.config)) {
            Ok(normalized) => normalized.to_data_uri(),
            Err(PortraitError::Decode(msg)) => {
                // Deliberate usability fallback: let the backend try the
                // original bytes rather than blocking the user here.
                tracing::warn!("photo did not decode ({msg}); sending original bytes");
                source_data_uri(photo)
            }
            Err(e) => return Err(e),
        };

        let request = GenerateRequest::new(payload, sport, meta);
        let generated = self.client.generate(&request, self.token.as_deref()).await?;
        let bytes = self.client.fetch_image(&generated).await?;
        let result = composite(&bytes, meta, Some(sport), self.font.as_ref());

        if self.token.is_some() {
            // Advisory only; the server already performed the decrement.
            if let Err(e) = self.refresh_credits().await {
                tracing::warn!("credit refresh after generation failed: {e}");
            }
        }

        Ok(result)
    }
}
