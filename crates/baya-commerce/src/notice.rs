//! User-facing notifications.
//!
//! Every outcome the shopper or the back-office user sees is a [`Notice`]
//! carrying French text. A [`NoticeBoard`] collects them for whoever renders
//! them and can suppress repeats of the same message within its own scope.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A message to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.text)
    }
}

/// Pending notices plus the set of messages already shown.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    shown: HashSet<Notice>,
    pending: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice unconditionally.
    pub fn push(&mut self, notice: Notice) {
        self.shown.insert(notice.clone());
        self.pending.push(notice);
    }

    /// Queue a notice unless an identical one was already queued.
    ///
    /// Returns `true` when the notice was queued.
    pub fn push_once(&mut self, notice: Notice) -> bool {
        if self.shown.contains(&notice) {
            return false;
        }
        self.push(notice);
        true
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }

    /// Forget which messages were shown.
    pub fn reset(&mut self) {
        self.shown.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// French message catalogue.
pub mod messages {
    pub const ADDED_TO_CART: &str = "Ajouté au panier";
    pub const ITEM_REMOVED: &str = "Article retiré du panier";
    pub const CART_CLEARED: &str = "Panier vidé";
    pub const ITEM_NOT_IN_CART: &str = "Cet article n'est plus dans votre panier";
    pub const EMPTY_CART: &str = "Votre panier est vide";
    pub const INVALID_QUANTITY: &str = "Quantité invalide";
    pub const STOCK_UNAVAILABLE: &str = "La quantité demandée n'est pas disponible en stock";
    pub const STOCK_INSUFFICIENT_SOME: &str =
        "Certains articles de votre panier ne sont plus disponibles en quantité suffisante";
    pub const STOCK_CHECK_FAILED: &str = "Erreur lors de la vérification du stock";
    pub const PROMO_MISSING: &str = "Veuillez saisir un code promo";
    pub const PROMO_APPLIED: &str = "Code promo appliqué avec succès !";
    pub const PROMO_INVALID: &str = "Code promo invalide";
    pub const PROMO_REMOVED: &str = "Code promo retiré";
    pub const PROMO_INVALIDATED: &str =
        "Le code promo a été retiré suite à la modification du panier";
    pub const DELIVERY_NOT_SELECTED: &str = "Veuillez sélectionner un mode de livraison";
    pub const ORDER_PLACED: &str =
        "Commande passée avec succès ! Vous recevrez un email de confirmation.";
    pub const ORDER_FAILED: &str =
        "Une erreur est survenue lors de la commande. Veuillez réessayer.";
    pub const PAYMENT_FAILED: &str = "Une erreur est survenue lors du paiement.";
    pub const PAYMENT_SUCCEEDED: &str = "Paiement réussi !";
    pub const SUBMISSION_IN_FLIGHT: &str = "Votre commande est en cours de traitement";
    pub const ABANDON_ORDER: &str = "Êtes-vous sûr de vouloir abandonner votre commande ?";
    pub const CONFIRM_REMOVE: &str = "Voulez-vous vraiment retirer cet article du panier ?";
    pub const CONFIRM_CLEAR: &str = "Êtes-vous sûr de vouloir vider votre panier ?";
    pub const INVALID_STEP: &str = "Étape de commande invalide";
    pub const FORM_INVALID: &str = "Veuillez corriger les champs en erreur";
    pub const SERVER_UNREACHABLE: &str = "Erreur de connexion au serveur";
    pub const UNSUPPORTED: &str = "Opération non disponible";
    pub const UNEXPECTED: &str = "Une erreur inattendue est survenue";
}
