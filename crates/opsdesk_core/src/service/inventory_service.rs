//! Store/inventory page: chemical purchases by partners.

use crate::analytics::{bucket_by_month, round2, trailing_months, MonthPoint};
use crate::hydrate::DisplayInfo;
use crate::listing::{apply_search, paginate, Page, PageRequest, SearchTerm, Searchable};
use crate::model::document::DocPath;
use crate::model::inventory::{self, ChemicalPurchase};
use crate::service::{ServiceContext, ServiceResult};
use crate::store::{Direction, DocumentStore, Query};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRow {
    #[serde(flatten)]
    pub purchase: ChemicalPurchase,
    pub partner_display: DisplayInfo,
    pub cost: f64,
}

impl Searchable for PurchaseRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.purchase.chemical_name.as_str(),
            self.partner_display.label.as_str(),
        ]
    }
}

/// Quantity and spend for one chemical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChemicalTotals {
    pub purchases: usize,
    pub quantity: f64,
    pub spend: f64,
}

pub struct InventoryService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> InventoryService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    fn purchases(&self) -> ServiceResult<Vec<ChemicalPurchase>> {
        self.ctx
            .load_all(inventory::COLLECTION, ChemicalPurchase::from_document)
    }

    /// Purchases, newest first, optionally for one partner.
    pub fn list(
        &self,
        partner: Option<&DocPath>,
        search: &SearchTerm,
        page: PageRequest,
    ) -> ServiceResult<Page<PurchaseRow>> {
        let mut query = Query::collection(inventory::COLLECTION);
        if let Some(partner) = partner {
            query = query.where_ref("partner_id", partner);
        }
        let purchases = self.ctx.load(
            &query.order_by("purchased_at", Direction::Descending),
            ChemicalPurchase::from_document,
        )?;

        let labels = self
            .ctx
            .resolver()
            .resolve(purchases.iter().filter_map(|purchase| purchase.partner.as_ref()));
        let rows = purchases
            .into_iter()
            .map(|purchase| PurchaseRow {
                partner_display: labels.display(purchase.partner.as_ref()),
                cost: round2(purchase.cost()),
                purchase,
            })
            .collect::<Vec<_>>();

        Ok(paginate(apply_search(rows, search), page))
    }

    pub fn spend_by_month(
        &self,
        now: DateTime<Utc>,
        months: usize,
    ) -> ServiceResult<Vec<MonthPoint>> {
        let purchases = self.purchases()?;
        let series = bucket_by_month(
            &purchases,
            |purchase| purchase.purchased_at,
            ChemicalPurchase::cost,
        );
        Ok(series.window(&trailing_months(now, months)))
    }

    /// Totals keyed by chemical name as stored.
    pub fn totals_by_chemical(&self) -> ServiceResult<BTreeMap<String, ChemicalTotals>> {
        let mut totals: BTreeMap<String, ChemicalTotals> = BTreeMap::new();
        for purchase in self.purchases()? {
            let entry = totals.entry(purchase.chemical_name.clone()).or_default();
            entry.purchases += 1;
            entry.quantity += purchase.quantity;
            entry.spend += purchase.cost();
        }
        for entry in totals.values_mut() {
            entry.spend = round2(entry.spend);
        }
        Ok(totals)
    }
}
