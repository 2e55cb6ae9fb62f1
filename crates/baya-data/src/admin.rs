//! Back-office CRUD screens.
//!
//! Each mutation is a direct REST call followed by a full refetch. A failed
//! call leaves the listed rows as they were.

use std::fmt::Display;

use baya_commerce::catalog::{Category, Order, OrderStatus, Product, PromoCode};
use baya_commerce::{CategoryId, CommerceError, Notice, OrderId, ProductId, PromoCodeId};
use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::dependency::ApiDependency;
use crate::transport::HttpRequest;

/// French messages shown by one admin screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminMessages {
    pub load_failed: &'static str,
    pub created: &'static str,
    pub create_failed: &'static str,
    pub updated: &'static str,
    pub update_failed: &'static str,
    pub deleted: &'static str,
    pub delete_failed: &'static str,
}

/// An entity managed from the back office.
pub trait AdminResource: Serialize + DeserializeOwned + Clone + Send + Sync {
    type Id: Display + Clone + PartialEq + Send + Sync;

    /// Collection path, e.g. `/articles`.
    const PATH: &'static str;
    /// Whether create, update and delete are offered.
    const WRITABLE: bool = true;
    const MESSAGES: AdminMessages;

    fn id(&self) -> Option<&Self::Id>;

    /// Form rules checked before any call.
    fn check(&self) -> Result<(), CommerceError>;
}

impl AdminResource for Product {
    type Id = ProductId;
    const PATH: &'static str = "/articles";
    const MESSAGES: AdminMessages = AdminMessages {
        load_failed: "Erreur lors de la récupération des produits",
        created: "Produit créé avec succès",
        create_failed: "Erreur lors de la création du produit",
        updated: "Produit mis à jour avec succès",
        update_failed: "Erreur lors de la mise à jour du produit",
        deleted: "Produit supprimé avec succès",
        delete_failed: "Erreur lors de la suppression du produit",
    };

    fn id(&self) -> Option<&ProductId> {
        self.id.as_ref()
    }

    fn check(&self) -> Result<(), CommerceError> {
        self.validate()
    }
}

impl AdminResource for Category {
    type Id = CategoryId;
    const PATH: &'static str = "/categories";
    const MESSAGES: AdminMessages = AdminMessages {
        load_failed: "Erreur lors de la récupération des catégories",
        created: "Catégorie créée avec succès",
        create_failed: "Erreur lors de la création de la catégorie",
        updated: "Catégorie mise à jour avec succès",
        update_failed: "Erreur lors de la mise à jour de la catégorie",
        deleted: "Catégorie supprimée avec succès",
        delete_failed: "Erreur lors de la suppression de la catégorie",
    };

    fn id(&self) -> Option<&CategoryId> {
        self.id.as_ref()
    }

    fn check(&self) -> Result<(), CommerceError> {
        self.validate()
    }
}

impl AdminResource for PromoCode {
    type Id = PromoCodeId;
    const PATH: &'static str = "/promo/promo-codes";
    const MESSAGES: AdminMessages = AdminMessages {
        load_failed: "Erreur lors de la récupération des codes promo",
        created: "Code promo créé avec succès",
        create_failed: "Erreur lors de la création du code promo",
        updated: "Code promo mis à jour avec succès",
        update_failed: "Erreur lors de la mise à jour du code promo",
        deleted: "Code promo supprimé avec succès",
        delete_failed: "Erreur lors de la suppression du code promo",
    };

    fn id(&self) -> Option<&PromoCodeId> {
        self.id.as_ref()
    }

    fn check(&self) -> Result<(), CommerceError> {
        self.validate()
    }
}

/// Orders are placed by the storefront; the back office only moves their status.
impl AdminResource for Order {
    type Id = OrderId;
    const PATH: &'static str = "/command";
    const WRITABLE: bool = false;
    const MESSAGES: AdminMessages = AdminMessages {
        load_failed: "Erreur lors du chargement des commandes",
        created: "",
        create_failed: "",
        updated: STATUS_UPDATED,
        update_failed: STATUS_UPDATE_FAILED,
        deleted: "",
        delete_failed: "",
    };

    fn id(&self) -> Option<&OrderId> {
        self.id.as_ref()
    }

    fn check(&self) -> Result<(), CommerceError> {
        Ok(())
    }
}

const STATUS_UPDATED: &str = "Statut de la commande mis à jour avec succès";
const STATUS_UPDATE_FAILED: &str = "Erreur lors de la mise à jour du statut";

fn failed(message: &'static str, detail: impl Display) -> CommerceError {
    CommerceError::AdminFailed {
        message,
        detail: detail.to_string(),
    }
}

/// One admin screen: the last listed rows of `R` and the calls that change them.
pub struct AdminScreen<'a, R: AdminResource> {
    client: &'a ApiClient,
    rows: Vec<R>,
    loaded: bool,
}

impl<'a, R: AdminResource> AdminScreen<'a, R> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            rows: Vec::new(),
            loaded: false,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, id: &R::Id) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == Some(id))
    }

    /// Fetch the full list. On failure the previous rows stay.
    pub async fn load(&mut self) -> Result<&[R], CommerceError> {
        let rows: Vec<R> = self
            .client
            .get_json(R::PATH, ApiDependency::Admin)
            .await
            .map_err(|e| failed(R::MESSAGES.load_failed, e))?;
        self.rows = rows;
        self.loaded = true;
        Ok(&self.rows)
    }

    pub async fn create(&mut self, values: &R) -> Result<Notice, CommerceError> {
        if !R::WRITABLE {
            return Err(CommerceError::Unsupported("create"));
        }
        values.check()?;
        let body = serde_json::to_value(values)?;
        self.client
            .send_json(Method::POST, R::PATH, body, ApiDependency::Admin)
            .await
            .map_err(|e| failed(R::MESSAGES.create_failed, e))?;
        info!(path = R::PATH, "created");
        self.refetch().await;
        Ok(Notice::success(R::MESSAGES.created))
    }

    pub async fn update(&mut self, id: &R::Id, values: &R) -> Result<Notice, CommerceError> {
        if !R::WRITABLE {
            return Err(CommerceError::Unsupported("update"));
        }
        values.check()?;
        let body = serde_json::to_value(values)?;
        let path = format!("{}/{}", R::PATH, id);
        self.client
            .send_json(Method::PUT, &path, body, ApiDependency::Admin)
            .await
            .map_err(|e| failed(R::MESSAGES.update_failed, e))?;
        info!(path = %path, "updated");
        self.refetch().await;
        Ok(Notice::success(R::MESSAGES.updated))
    }

    pub async fn delete(&mut self, id: &R::Id) -> Result<Notice, CommerceError> {
        if !R::WRITABLE {
            return Err(CommerceError::Unsupported("delete"));
        }
        let path = format!("{}/{}", R::PATH, id);
        let request = HttpRequest::new(Method::DELETE, self.client.url(&path));
        self.client
            .execute(request, ApiDependency::Admin)
            .await
            .map_err(|e| failed(R::MESSAGES.delete_failed, e))?;
        info!(path = %path, "deleted");
        self.refetch().await;
        Ok(Notice::success(R::MESSAGES.deleted))
    }

    async fn refetch(&mut self) {
        if let Err(e) = self.load().await {
            warn!(path = R::PATH, error = %e, "refetch after change failed");
        }
    }
}

impl AdminScreen<'_, Order> {
    /// Move an order to `status`.
    pub async fn update_status(
        &mut self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Notice, CommerceError> {
        let path = format!("{}/{}/status", Order::PATH, id);
        self.client
            .send_json(
                Method::PUT,
                &path,
                json!({ "status": status }),
                ApiDependency::Admin,
            )
            .await
            .map_err(|e| failed(STATUS_UPDATE_FAILED, e))?;
        info!(order = %id, status = status.as_str(), "order status updated");
        self.refetch().await;
        Ok(Notice::success(STATUS_UPDATED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client, ok, status, ScriptedTransport};
    use crate::error::FetchError;
    use baya_commerce::Money;

    fn product_rows() -> serde_json::Value {
        json!([
            {"ID_ART": 1, "Nom": "Dattes Medjool", "Prix": "12.50", "Quantite": 7, "ID_CAT": 2},
            {"ID_ART": 2, "Nom": "Miel de thym", "Prix": 9, "Quantite": "0", "ID_CAT": 2}
        ])
    }

    #[tokio::test]
    async fn test_load_lists_rows_with_admin_token() {
        let transport = ScriptedTransport::new(vec![ok(product_rows())]);
        let api = client(transport.clone());
        let mut screen = AdminScreen::<Product>::new(&api);

        let rows = screen.load().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price, Money::eur(12.5));
        let sent = transport.sent();
        assert_eq!(sent[0].url, "http://api.test/articles");
        assert_eq!(sent[0].bearer.as_deref(), Some("jeton"));
    }

    #[tokio::test]
    async fn test_create_posts_then_refetches() {
        let transport = ScriptedTransport::new(vec![
            ok(json!({"success": true})),
            ok(product_rows()),
        ]);
        let api = client(transport.clone());
        let mut screen = AdminScreen::<Product>::new(&api);

        let notice = screen
            .create(&Product::new("Dattes Medjool", Money::eur(12.5), "2"))
            .await
            .unwrap();

        assert_eq!(notice.text, "Produit créé avec succès");
        assert_eq!(screen.rows().len(), 2);
        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].body.as_ref().unwrap()["Nom"], "Dattes Medjool");
        assert_eq!(sent[1].method, Method::GET);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_prior_rows() {
        let transport = ScriptedTransport::new(vec![
            ok(product_rows()),
            status(500, json!({"message": "boom"})),
        ]);
        let api = client(transport.clone());
        let mut screen = AdminScreen::<Product>::new(&api);
        screen.load().await.unwrap();

        let err = screen.delete(&ProductId::new("1")).await.unwrap_err();

        assert_eq!(err.notice().text, "Erreur lors de la suppression du produit");
        assert_eq!(screen.rows().len(), 2);
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_form_makes_no_call() {
        let transport = ScriptedTransport::new(vec![]);
        let api = client(transport.clone());
        let mut screen = AdminScreen::<Category>::new(&api);

        let err = screen.create(&Category::new("  ")).await.unwrap_err();

        assert!(matches!(err, CommerceError::FormInvalid(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_rows() {
        let transport = ScriptedTransport::new(vec![
            ok(json!([{"ID_CAT": 2, "Nom": "Épicerie"}])),
            Err(FetchError::Connection("refused".to_string())),
            Err(FetchError::Connection("refused".to_string())),
        ]);
        let api = client(transport);
        let mut screen = AdminScreen::<Category>::new(&api);
        screen.load().await.unwrap();

        let err = screen.load().await.unwrap_err();

        assert_eq!(err.notice().text, "Erreur lors de la récupération des catégories");
        assert_eq!(screen.rows()[0].name, "Épicerie");
    }

    #[tokio::test]
    async fn test_orders_are_read_only() {
        let api = client(ScriptedTransport::new(vec![]));
        let mut screen = AdminScreen::<Order>::new(&api);
        let err = screen.delete(&OrderId::new("9")).await.unwrap_err();
        assert!(matches!(err, CommerceError::Unsupported("delete")));
    }

    #[tokio::test]
    async fn test_update_order_status() {
        let transport = ScriptedTransport::new(vec![
            ok(json!({"success": true})),
            ok(json!([{"ID_CMD": 9, "statut_CMD": "shipped", "montant": "49.90"}])),
        ]);
        let api = client(transport.clone());
        let mut screen = AdminScreen::<Order>::new(&api);

        let notice = screen
            .update_status(&OrderId::new("9"), OrderStatus::Shipped)
            .await
            .unwrap();

        assert_eq!(notice.text, STATUS_UPDATED);
        assert_eq!(screen.find(&OrderId::new("9")).unwrap().status, OrderStatus::Shipped);
        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(sent[0].url, "http://api.test/command/9/status");
        assert_eq!(sent[0].body, Some(json!({"status": "shipped"})));
    }

    #[tokio::test]
    async fn test_refetch_failure_still_reports_success() {
        let transport = ScriptedTransport::new(vec![
            ok(json!({})),
            Err(FetchError::Connection("reset".to_string())),
            Err(FetchError::Connection("reset".to_string())),
        ]);
        let api = client(transport);
        let mut screen = AdminScreen::<Category>::new(&api);

        let notice = screen
            .update(&CategoryId::new("2"), &Category::new("Épicerie fine"))
            .await
            .unwrap();

        assert_eq!(notice.text, "Catégorie mise à jour avec succès");
        assert!(!screen.is_loaded());
    }
}
