//! Partners page.
//!
//! # Invariants
//! - Wallet, job and rating figures come from one bulk read per collection.
//! - A partner without reviews has no average rating rather than `0`.

use crate::analytics::round2;
use crate::listing::{apply_search, paginate, Page, PageRequest, SearchTerm, Searchable};
use crate::model::booking::{self, Booking};
use crate::model::document::DocPath;
use crate::model::partner::{self, Partner, PartnerWallet};
use crate::model::review::{self, Review};
use crate::service::{decode_all, ServiceContext, ServiceResult};
use crate::store::{DocumentStore, Query};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerRow {
    #[serde(flatten)]
    pub partner: Partner,
    pub label: String,
    pub wallet_balance: f64,
    pub completed_jobs: usize,
    pub average_rating: Option<f64>,
    pub review_count: usize,
}

impl Searchable for PartnerRow {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.partner.path.id(), self.label.as_str()];
        fields.extend(self.partner.email.as_deref());
        fields.extend(self.partner.phone_number.as_deref());
        fields.extend(self.partner.category.as_deref());
        fields
    }
}

pub struct PartnerService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> PartnerService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    /// Partners sorted by label.
    pub fn list(&self, search: &SearchTerm, page: PageRequest) -> ServiceResult<Page<PartnerRow>> {
        let partners = self
            .ctx
            .load_all(partner::COLLECTION, Partner::from_document)?;
        let wallets = self
            .ctx
            .load_all(partner::WALLET_COLLECTION, PartnerWallet::from_document)?;
        let bookings = self
            .ctx
            .load_all(booking::COLLECTION, Booking::from_document)?;
        let reviews = self
            .ctx
            .load_all(review::COLLECTION, Review::from_document)?;

        let mut balances: HashMap<&DocPath, f64> = HashMap::new();
        for wallet in &wallets {
            if let Some(partner) = &wallet.partner {
                *balances.entry(partner).or_insert(0.0) += wallet.balance;
            }
        }

        let mut completed: HashMap<&DocPath, usize> = HashMap::new();
        for booking in bookings.iter().filter(|booking| booking.is_completed()) {
            if let Some(provider) = &booking.provider {
                *completed.entry(provider).or_insert(0) += 1;
            }
        }

        let mut ratings: HashMap<&DocPath, (usize, u32)> = HashMap::new();
        for review in &reviews {
            if let Some(provider) = &review.provider {
                let entry = ratings.entry(provider).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += u32::from(review.rating);
            }
        }

        let mut rows = partners
            .into_iter()
            .map(|partner| {
                let (review_count, rating_sum) =
                    ratings.get(&partner.path).copied().unwrap_or((0, 0));
                PartnerRow {
                    label: partner
                        .display_label()
                        .unwrap_or_else(|| self.ctx.unknown_label().to_string()),
                    wallet_balance: round2(balances.get(&partner.path).copied().unwrap_or(0.0)),
                    completed_jobs: completed.get(&partner.path).copied().unwrap_or(0),
                    average_rating: (review_count > 0)
                        .then(|| round2(f64::from(rating_sum) / review_count as f64)),
                    review_count,
                    partner,
                }
            })
            .collect::<Vec<_>>();
        rows.sort_by(|left, right| {
            left.label
                .to_lowercase()
                .cmp(&right.label.to_lowercase())
                .then_with(|| left.partner.path.cmp(&right.partner.path))
        });

        Ok(paginate(apply_search(rows, search), page))
    }

    /// Credit wallet of `partner`, if one exists.
    pub fn wallet(&self, partner: &DocPath) -> ServiceResult<Option<PartnerWallet>> {
        let documents = self.ctx.store().query(
            &Query::collection(partner::WALLET_COLLECTION)
                .where_ref("partner_id", partner)
                .limit(1),
        )?;
        Ok(decode_all(documents, PartnerWallet::from_document)
            .into_iter()
            .next())
    }
}
