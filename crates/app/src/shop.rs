//! Shop controller
//!
//! Single owner of all storefront session state: the cart, the checkout
//! session, the chat transcript and the working sticker draft. The cart
//! aggregator and checkout state machine are pure transitions over this
//! state; gateway failures arrive here as typed errors and are either
//! propagated for display or converted to the storefront's fixed
//! fallbacks, with the error kind logged either way.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use decal::{
    cart::Cart,
    checkout::{CardDetails, CheckoutError, CheckoutSession, PaymentMethod},
    stickers::{self, ImageSource, Sticker, StickerId},
};

use crate::{
    gateway::{
        AspectRatio, ChatTranscript, GatewayError, ImageData, SpeechAudio, StickerGateway,
        VideoData,
    },
    payments::{PaymentError, PaymentGateway, PaymentInstrument, PaymentReceipt},
};

/// Fixed fallback line appended when the chat model cannot be reached.
pub const CHAT_APOLOGY: &str = "Sorry, something went wrong.";

/// Errors surfaced to the shell.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Operation invoked with a blank prompt; rejected before dispatch.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// No working sticker draft for the requested operation.
    #[error("no sticker draft; generate one first")]
    NoDraft,

    /// Checkout transition rejected.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Gateway failure propagated for display.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Payment provider failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// An uncommitted sticker design being worked on.
#[derive(Debug, Clone)]
pub struct Draft {
    /// Current artwork; replaced wholesale by edits.
    pub image: ImageData,
    /// Prompt the artwork came from.
    pub prompt: String,
    /// Display/file name, derived from the prompt by default.
    pub name: String,
}

/// Top-level controller owning all storefront session state.
pub struct Shop {
    gateway: Arc<dyn StickerGateway>,
    payments: Arc<dyn PaymentGateway>,
    cart: Cart,
    session: CheckoutSession,
    transcript: ChatTranscript,
    draft: Option<Draft>,
    last_order_id: Option<String>,
}

impl std::fmt::Debug for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shop")
            .field("cart", &self.cart)
            .field("session", &self.session)
            .field("draft", &self.draft.is_some())
            .finish_non_exhaustive()
    }
}

impl Shop {
    /// Create a fresh session over the given service boundaries.
    #[must_use]
    pub fn new(gateway: Arc<dyn StickerGateway>, payments: Arc<dyn PaymentGateway>) -> Self {
        Self {
            gateway,
            payments,
            cart: Cart::new(),
            session: CheckoutSession::new(),
            transcript: ChatTranscript::with_greeting(),
            draft: None,
            last_order_id: None,
        }
    }

    /// Read-only view of the cart.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Read-only view of the checkout session.
    #[must_use]
    pub fn session(&self) -> &CheckoutSession {
        &self.session
    }

    /// Read-only view of the conversation.
    #[must_use]
    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    /// The working draft, if any.
    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Order reference of the most recent completed purchase.
    #[must_use]
    pub fn last_order_id(&self) -> Option<&str> {
        self.last_order_id.as_deref()
    }

    fn require_prompt(text: &str) -> Result<&str, ShopError> {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Err(ShopError::EmptyPrompt);
        }

        Ok(trimmed)
    }

    /// Generate a new working draft from a prompt.
    ///
    /// # Errors
    ///
    /// Rejects blank prompts before dispatch; otherwise propagates the
    /// gateway error. The previous draft survives a failed generation.
    pub async fn create_sticker(&mut self, prompt: &str) -> Result<(), ShopError> {
        let prompt = Self::require_prompt(prompt)?;

        let image = self.gateway.generate_image(prompt).await?;

        self.draft = Some(Draft {
            image,
            prompt: prompt.to_owned(),
            name: stickers::derive_name(prompt),
        });

        Ok(())
    }

    /// Load existing artwork as the working draft (e.g. from disk).
    pub fn load_draft(&mut self, image: ImageData, name: impl Into<String>) {
        self.draft = Some(Draft {
            image,
            prompt: String::new(),
            name: name.into(),
        });
    }

    /// Rename the working draft.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NoDraft`] when nothing is being worked on.
    pub fn rename_draft(&mut self, name: &str) -> Result<(), ShopError> {
        let draft = self.draft.as_mut().ok_or(ShopError::NoDraft)?;
        draft.name = name.to_owned();

        Ok(())
    }

    /// Discard the working draft.
    pub fn discard_draft(&mut self) {
        self.draft = None;
    }

    /// Re-work the draft artwork per edit instructions.
    ///
    /// The artwork reference is replaced wholesale; stickers already in
    /// the cart are unaffected.
    ///
    /// # Errors
    ///
    /// Rejects blank instructions, requires a draft, and propagates
    /// gateway errors (the draft keeps its previous artwork on failure).
    pub async fn edit_sticker(&mut self, instructions: &str) -> Result<(), ShopError> {
        let instructions = Self::require_prompt(instructions)?;
        let draft = self.draft.as_mut().ok_or(ShopError::NoDraft)?;

        let image = self.gateway.edit_image(&draft.image, instructions).await?;
        draft.image = image;

        Ok(())
    }

    /// Commit the draft into the cart at the standard price.
    ///
    /// The shell is expected to navigate to the cart view afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NoDraft`] when nothing is being worked on.
    pub fn add_to_cart(&mut self) -> Result<StickerId, ShopError> {
        let draft = self.draft.take().ok_or(ShopError::NoDraft)?;

        let sticker = Sticker::priced_default(ImageSource::Png(draft.image.bytes), draft.prompt);
        let id = sticker.id;

        self.cart.add(sticker);

        Ok(id)
    }

    /// Add a catalog sticker to the cart.
    pub fn add_sticker(&mut self, sticker: Sticker) {
        self.cart.add(sticker);
    }

    /// Remove a cart entry; a no-op when absent.
    pub fn remove_from_cart(&mut self, id: &StickerId) {
        self.cart.remove(id);
    }

    /// Adjust a cart entry's quantity; floors at 1, no-op when absent.
    pub fn change_quantity(&mut self, id: &StickerId, delta: i32) {
        self.cart.update_quantity(id, delta);
    }

    /// Send a chat message and append the assistant's reply.
    ///
    /// Gateway failures are logged and answered with [`CHAT_APOLOGY`]; the
    /// conversation flow never crashes.
    ///
    /// # Errors
    ///
    /// Rejects blank messages before dispatch.
    pub async fn chat(&mut self, text: &str) -> Result<&str, ShopError> {
        let text = Self::require_prompt(text)?;

        self.transcript.push_user(text);

        match self.gateway.send_chat(&self.transcript).await {
            Ok(reply) => self.transcript.push_assistant(reply),
            Err(error) => {
                tracing::warn!(%error, "chat request failed; answering with apology");
                self.transcript.push_assistant(CHAT_APOLOGY);
            }
        }

        Ok(self
            .transcript
            .last()
            .map_or(CHAT_APOLOGY, |message| message.text.as_str()))
    }

    /// Transcribe a WAV voice note into prompt text.
    ///
    /// Failures are logged and yield an empty string, matching the
    /// dictation flow's contract of never crashing input capture.
    pub async fn transcribe(&self, wav: &[u8]) -> String {
        match self.gateway.transcribe_audio(wav).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(%error, "transcription failed");
                String::new()
            }
        }
    }

    /// Creative feedback on a sticker idea.
    ///
    /// # Errors
    ///
    /// Rejects blank prompts; propagates gateway errors.
    pub async fn analyze_idea(&self, idea: &str) -> Result<String, ShopError> {
        let idea = Self::require_prompt(idea)?;

        Ok(self.gateway.analyze_idea(idea).await?)
    }

    /// Speak a phrase through the TTS model.
    ///
    /// # Errors
    ///
    /// Rejects blank prompts; propagates gateway errors.
    pub async fn speak(&self, text: &str) -> Result<SpeechAudio, ShopError> {
        let text = Self::require_prompt(text)?;

        Ok(self.gateway.synthesize_speech(text).await?)
    }

    /// Generate a promotional video.
    ///
    /// # Errors
    ///
    /// Rejects blank prompts; propagates gateway errors, including
    /// time-outs and cancellation at poll boundaries.
    pub async fn promo_video(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        cancel: &CancellationToken,
    ) -> Result<VideoData, ShopError> {
        let prompt = Self::require_prompt(prompt)?;

        Ok(self
            .gateway
            .generate_video(prompt, aspect_ratio, cancel)
            .await?)
    }

    /// Start checkout: `Cart` to `PaymentDetails`.
    ///
    /// # Errors
    ///
    /// Blocked with an empty cart; the phase does not change.
    pub fn begin_checkout(&mut self) -> Result<(), ShopError> {
        self.session.begin_payment(&self.cart)?;

        Ok(())
    }

    /// Return to the cart view without submitting payment.
    ///
    /// # Errors
    ///
    /// Only valid from `PaymentDetails`.
    pub fn back_to_cart(&mut self) -> Result<(), ShopError> {
        self.session.back_to_cart()?;

        Ok(())
    }

    /// Choose the payment instrument.
    pub fn select_method(&mut self, method: PaymentMethod) {
        self.session.select_method(method);
    }

    /// Capture card fields for a card payment.
    pub fn set_card(&mut self, card: CardDetails) {
        self.session.set_card(card);
    }

    /// Submit the payment and drive `Processing` to its outcome.
    ///
    /// On approval the session lands in `Success` and the order reference
    /// is retained; on decline it lands in `Failed` and the provider error
    /// is returned for display.
    ///
    /// # Errors
    ///
    /// Only valid from `PaymentDetails`; otherwise propagates the provider
    /// error.
    pub async fn submit_payment(&mut self) -> Result<PaymentReceipt, ShopError> {
        self.session.submit_payment()?;

        let instrument = match self.session.method() {
            PaymentMethod::Card => {
                PaymentInstrument::Card(self.session.card().cloned().unwrap_or_default())
            }
            PaymentMethod::ExternalWallet => PaymentInstrument::ExternalWallet,
        };

        match self
            .payments
            .submit_payment(self.session.method(), self.cart.total(), &instrument)
            .await
        {
            Ok(receipt) => {
                self.session.complete()?;
                self.last_order_id = Some(receipt.order_id.clone());

                Ok(receipt)
            }
            Err(error) => {
                tracing::warn!(%error, "payment failed");
                self.session.fail()?;

                Err(error.into())
            }
        }
    }

    /// Return to the instrument form after a decline.
    ///
    /// # Errors
    ///
    /// Only valid from `Failed`.
    pub fn retry_payment(&mut self) -> Result<(), ShopError> {
        self.session.retry()?;

        Ok(())
    }

    /// Simulated redirect-after-confirmation: `Success` back to `Cart`
    /// with the cart emptied and the instrument discarded.
    ///
    /// # Errors
    ///
    /// Only valid from `Success`.
    pub fn finish_checkout(&mut self) -> Result<(), ShopError> {
        self.session.reset(&mut self.cart)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use decal::checkout::CheckoutPhase;
    use testresult::TestResult;

    use crate::{
        gateway::MockStickerGateway,
        payments::{MockPaymentGateway, SimulatedPaymentGateway},
    };

    use super::*;

    fn image(bytes: &[u8]) -> ImageData {
        ImageData {
            mime_type: "image/png".to_owned(),
            bytes: bytes.to_vec(),
        }
    }

    fn shop_with_gateway(gateway: MockStickerGateway) -> Shop {
        Shop::new(
            Arc::new(gateway),
            Arc::new(SimulatedPaymentGateway::default()),
        )
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_dispatch() {
        let mut gateway = MockStickerGateway::new();
        gateway.expect_generate_image().never();

        let mut shop = shop_with_gateway(gateway);

        let result = shop.create_sticker("   ").await;

        assert!(
            matches!(result, Err(ShopError::EmptyPrompt)),
            "expected EmptyPrompt, got {result:?}"
        );
        assert!(shop.draft().is_none());
    }

    #[tokio::test]
    async fn generation_stores_a_named_draft() -> TestResult {
        let mut gateway = MockStickerGateway::new();
        gateway
            .expect_generate_image()
            .returning(|_| Ok(ImageData {
                mime_type: "image/png".to_owned(),
                bytes: b"png".to_vec(),
            }));

        let mut shop = shop_with_gateway(gateway);

        shop.create_sticker("An Astronaut Cat eating pizza").await?;

        let draft = shop.draft().ok_or("draft should exist")?;

        assert_eq!(draft.name, "an_astronaut_cat_eat");
        assert_eq!(draft.image.bytes, b"png");

        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_typed_error() {
        let mut gateway = MockStickerGateway::new();
        gateway
            .expect_generate_image()
            .returning(|_| Err(GatewayError::EmptyModelOutput));

        let mut shop = shop_with_gateway(gateway);

        let result = shop.create_sticker("a dragon").await;

        assert!(
            matches!(result, Err(ShopError::Gateway(_))),
            "expected Gateway error, got {result:?}"
        );
        assert!(shop.draft().is_none(), "failed generation must not store a draft");
    }

    #[tokio::test]
    async fn editing_replaces_the_working_image_only() -> TestResult {
        let mut gateway = MockStickerGateway::new();
        gateway
            .expect_generate_image()
            .returning(|_| Ok(ImageData {
                mime_type: "image/png".to_owned(),
                bytes: b"v1".to_vec(),
            }));
        gateway
            .expect_edit_image()
            .withf(|base, instructions| base.bytes == b"v1" && instructions == "add sunglasses")
            .returning(|_, _| Ok(ImageData {
                mime_type: "image/png".to_owned(),
                bytes: b"v2".to_vec(),
            }));

        let mut shop = shop_with_gateway(gateway);

        shop.create_sticker("a cool cat").await?;
        shop.add_to_cart()?;

        // A fresh draft, edited; the committed cart sticker keeps v1.
        shop.load_draft(image(b"v1"), "cool-cat");
        shop.edit_sticker("add sunglasses").await?;

        let draft = shop.draft().ok_or("draft should exist")?;
        assert_eq!(draft.image.bytes, b"v2");

        let committed = &shop.cart().items()[0].sticker;
        assert_eq!(committed.image, ImageSource::Png(b"v1".to_vec()));

        Ok(())
    }

    #[tokio::test]
    async fn editing_without_a_draft_is_rejected() {
        let mut gateway = MockStickerGateway::new();
        gateway.expect_edit_image().never();

        let mut shop = shop_with_gateway(gateway);

        let result = shop.edit_sticker("make it retro").await;

        assert!(
            matches!(result, Err(ShopError::NoDraft)),
            "expected NoDraft, got {result:?}"
        );
    }

    #[tokio::test]
    async fn chat_failure_answers_with_the_apology() -> TestResult {
        let mut gateway = MockStickerGateway::new();
        gateway
            .expect_send_chat()
            .returning(|_| Err(GatewayError::EmptyModelOutput));

        let mut shop = shop_with_gateway(gateway);

        let reply = shop.chat("do you ship to Mars?").await?.to_owned();

        assert_eq!(reply, CHAT_APOLOGY);
        // Greeting, user message, apology.
        assert_eq!(shop.transcript().len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn chat_appends_user_and_assistant_messages() -> TestResult {
        let mut gateway = MockStickerGateway::new();
        gateway
            .expect_send_chat()
            .withf(|transcript| {
                transcript
                    .last()
                    .is_some_and(|message| message.text == "hello")
            })
            .returning(|_| Ok("hi there!".to_owned()));

        let mut shop = shop_with_gateway(gateway);

        let reply = shop.chat("hello").await?.to_owned();

        assert_eq!(reply, "hi there!");
        assert_eq!(shop.transcript().len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn transcription_failure_yields_empty_text() {
        let mut gateway = MockStickerGateway::new();
        gateway
            .expect_transcribe_audio()
            .returning(|_| Err(GatewayError::EmptyModelOutput));

        let shop = shop_with_gateway(gateway);

        assert_eq!(shop.transcribe(b"RIFF...").await, "");
    }

    #[tokio::test(start_paused = true)]
    async fn full_checkout_cycle_clears_the_cart() -> TestResult {
        let mut gateway = MockStickerGateway::new();
        gateway
            .expect_generate_image()
            .returning(|_| Ok(ImageData {
                mime_type: "image/png".to_owned(),
                bytes: b"art".to_vec(),
            }));

        let mut shop = shop_with_gateway(gateway);

        shop.create_sticker("a happy sun").await?;
        shop.add_to_cart()?;

        shop.begin_checkout()?;
        assert_eq!(shop.session().phase(), CheckoutPhase::PaymentDetails);

        shop.select_method(PaymentMethod::Card);
        shop.set_card(CardDetails {
            holder: "JOHN DOE".to_owned(),
            number: "4242 4242 4242 4242".to_owned(),
            expiry: "12/26".to_owned(),
            cvc: "123".to_owned(),
        });

        let receipt = shop.submit_payment().await?;

        assert_eq!(shop.session().phase(), CheckoutPhase::Success);
        assert!(receipt.order_id.starts_with("STK-"), "got {receipt:?}");
        assert_eq!(shop.last_order_id(), Some(receipt.order_id.as_str()));

        shop.finish_checkout()?;

        assert_eq!(shop.session().phase(), CheckoutPhase::Cart);
        assert!(shop.cart().is_empty());
        assert!(shop.session().card().is_none());

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_blocks_checkout() {
        let gateway = MockStickerGateway::new();
        let mut shop = shop_with_gateway(gateway);

        let result = shop.begin_checkout();

        assert!(
            matches!(
                result,
                Err(ShopError::Checkout(CheckoutError::EmptyCart))
            ),
            "expected EmptyCart, got {result:?}"
        );
        assert_eq!(shop.session().phase(), CheckoutPhase::Cart);
    }

    #[tokio::test]
    async fn declined_payment_lands_in_failed_and_can_retry() -> TestResult {
        let mut payments = MockPaymentGateway::new();
        payments.expect_submit_payment().returning(|_, _, _| {
            Err(PaymentError::Declined("insufficient funds".to_owned()))
        });

        let mut shop = Shop::new(Arc::new(MockStickerGateway::new()), Arc::new(payments));

        shop.load_draft(image(b"art"), "sun");
        shop.add_to_cart()?;
        shop.begin_checkout()?;

        let result = shop.submit_payment().await;

        assert!(
            matches!(result, Err(ShopError::Payment(PaymentError::Declined(_)))),
            "expected Declined, got {result:?}"
        );
        assert_eq!(shop.session().phase(), CheckoutPhase::Failed);

        shop.retry_payment()?;
        assert_eq!(shop.session().phase(), CheckoutPhase::PaymentDetails);

        Ok(())
    }

    #[tokio::test]
    async fn add_to_cart_without_a_draft_is_rejected() {
        let mut shop = shop_with_gateway(MockStickerGateway::new());

        let result = shop.add_to_cart();

        assert!(
            matches!(result, Err(ShopError::NoDraft)),
            "expected NoDraft, got {result:?}"
        );
    }
}
