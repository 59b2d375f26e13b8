//! Service wiring: storage backends plus the operations handlers call.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use exportdesk_core::{DomainError, Entity, InvoiceId, PartyId, ProductId};
use exportdesk_documents::{RenderError, invoice_filename, render_invoice_pdf};
use exportdesk_infra::{
    CsvImportError, InMemoryStore, PgInvoiceStore, PgPartyStore, PgProductStore, RecordStore,
    StorageConfig, StoreError, connect,
};
use exportdesk_invoicing::{Invoice, InvoiceDraft};
use exportdesk_parties::{NewParty, Party, PartyKind, PartyRow, parties_from_rows};
use exportdesk_products::{NewProduct, Product, ProductRow, products_from_rows};

/// Number of invoices shown on the dashboard.
pub const DASHBOARD_RECENT: usize = 20;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] CsvImportError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Outcome of a bulk upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub total_invoices: u64,
    pub recent: Vec<Invoice>,
}

/// A rendered invoice document.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct AppServices {
    parties: Arc<dyn RecordStore<Party>>,
    products: Arc<dyn RecordStore<Product>>,
    invoices: Arc<dyn RecordStore<Invoice>>,
}

/// Wire the storage backend selected by configuration.
pub async fn build_services(storage: &StorageConfig) -> Result<AppServices, StoreError> {
    match storage {
        StorageConfig::InMemory => {
            tracing::info!("using in-memory stores");
            Ok(AppServices::in_memory())
        }
        StorageConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = connect(database_url, *max_connections).await?;
            tracing::info!(max_connections = *max_connections, "using postgres stores");
            Ok(AppServices::new(
                Arc::new(PgPartyStore::new(pool.clone())),
                Arc::new(PgProductStore::new(pool.clone())),
                Arc::new(PgInvoiceStore::new(pool)),
            ))
        }
    }
}

impl AppServices {
    pub fn new(
        parties: Arc<dyn RecordStore<Party>>,
        products: Arc<dyn RecordStore<Product>>,
        invoices: Arc<dyn RecordStore<Invoice>>,
    ) -> Self {
        Self {
            parties,
            products,
            invoices,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStore::<Party>::new()),
            Arc::new(InMemoryStore::<Product>::new()),
            Arc::new(InMemoryStore::<Invoice>::new()),
        )
    }

    // -------------------------
    // Parties
    // -------------------------

    pub async fn create_party(&self, input: NewParty) -> ServiceResult<Party> {
        let party = input.into_party(PartyId::new(), Utc::now())?;
        let party = self.parties.insert(party).await?;
        tracing::info!(party_id = %party.id, kind = %party.kind, "party created");
        Ok(party)
    }

    pub async fn import_parties(&self, rows: Vec<PartyRow>) -> ServiceResult<ImportSummary> {
        let total = rows.len();
        let now = Utc::now();
        let parties = parties_from_rows(rows)?
            .into_iter()
            .map(|p| p.into_party(PartyId::new(), now))
            .collect::<Result<Vec<_>, _>>()?;

        let imported = self.parties.insert_many(parties).await?;
        let summary = ImportSummary {
            imported,
            skipped: total - imported,
        };
        tracing::info!(imported, skipped = summary.skipped, "parties imported");
        Ok(summary)
    }

    pub async fn list_parties(&self, kind: Option<PartyKind>) -> ServiceResult<Vec<Party>> {
        let mut parties = self.parties.list(None).await?;
        if let Some(kind) = kind {
            parties.retain(|p| p.kind == kind);
        }
        Ok(parties)
    }

    pub async fn get_party(&self, id: PartyId) -> ServiceResult<Party> {
        self.parties
            .get(&id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("party {id}")).into())
    }

    pub async fn delete_party(&self, id: PartyId) -> ServiceResult<()> {
        if !self.parties.delete(&id).await? {
            return Err(DomainError::not_found(format!("party {id}")).into());
        }
        tracing::info!(party_id = %id, "party deleted");
        Ok(())
    }

    // -------------------------
    // Products
    // -------------------------

    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<Product> {
        let product = input.into_product(ProductId::new(), Utc::now())?;
        let product = self.products.insert(product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn import_products(&self, rows: Vec<ProductRow>) -> ServiceResult<ImportSummary> {
        let total = rows.len();
        let now = Utc::now();
        let products = products_from_rows(rows)?
            .into_iter()
            .map(|p| p.into_product(ProductId::new(), now))
            .collect::<Result<Vec<_>, _>>()?;

        let imported = self.products.insert_many(products).await?;
        let summary = ImportSummary {
            imported,
            skipped: total - imported,
        };
        tracing::info!(imported, skipped = summary.skipped, "products imported");
        Ok(summary)
    }

    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.products.list(None).await?)
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<Product> {
        self.products
            .get(&id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {id}")).into())
    }

    pub async fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        if !self.products.delete(&id).await? {
            return Err(DomainError::not_found(format!("product {id}")).into());
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    // -------------------------
    // Invoices
    // -------------------------

    /// Resolve referenced parties and catalog products, then validate and store.
    pub async fn create_invoice(&self, mut draft: InvoiceDraft) -> ServiceResult<Invoice> {
        let exporter = self.referenced_party(draft.exporter_id, "exporter_id").await?;
        let consignee = self.referenced_party(draft.consignee_id, "consignee_id").await?;
        let notify = self.referenced_party(draft.notify_id, "notify_id").await?;
        draft.apply_parties(exporter.as_ref(), consignee.as_ref(), notify.as_ref())?;

        if !draft.items.is_empty() {
            let products = self.products.list(None).await?;
            draft.apply_products(&products);
        }

        let invoice = draft.compose(InvoiceId::new(), Utc::now())?;
        let invoice = self.invoices.insert(invoice).await?;
        tracing::info!(
            invoice_id = %invoice.id,
            invoice_no = %invoice.invoice_no,
            items = invoice.items.len(),
            total = %invoice.total_amount_cif,
            "invoice created"
        );
        Ok(invoice)
    }

    async fn referenced_party(
        &self,
        id: Option<PartyId>,
        field: &str,
    ) -> ServiceResult<Option<Party>> {
        let Some(id) = id else {
            return Ok(None);
        };
        match self.parties.get(&id).await? {
            Some(party) => Ok(Some(party)),
            None => Err(DomainError::validation(format!("{field}: party {id} does not exist")).into()),
        }
    }

    pub async fn list_invoices(&self, limit: Option<usize>) -> ServiceResult<Vec<Invoice>> {
        Ok(self.invoices.list(limit).await?)
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> ServiceResult<Invoice> {
        self.invoices
            .get(&id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("invoice {id}")).into())
    }

    pub async fn delete_invoice(&self, id: InvoiceId) -> ServiceResult<()> {
        if !self.invoices.delete(&id).await? {
            return Err(DomainError::not_found(format!("invoice {id}")).into());
        }
        tracing::info!(invoice_id = %id, "invoice deleted");
        Ok(())
    }

    pub async fn dashboard(&self) -> ServiceResult<Dashboard> {
        let total_invoices = self.invoices.count().await?;
        let recent = self.invoices.list(Some(DASHBOARD_RECENT)).await?;
        Ok(Dashboard {
            total_invoices,
            recent,
        })
    }

    pub async fn invoice_pdf(&self, id: InvoiceId) -> ServiceResult<RenderedPdf> {
        let invoice = self.get_invoice(id).await?;
        let bytes = render_invoice_pdf(&invoice).inspect_err(|e| {
            tracing::warn!(invoice_id = %invoice.id(), error = %e, "pdf rendering failed");
        })?;
        Ok(RenderedPdf {
            filename: invoice_filename(&invoice.invoice_no),
            bytes,
        })
    }
}
