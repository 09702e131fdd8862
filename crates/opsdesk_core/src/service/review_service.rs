//! Reviews page and rating widgets.

use crate::analytics::round2;
use crate::hydrate::DisplayInfo;
use crate::listing::{apply_search, paginate, Page, PageRequest, SearchTerm, Searchable};
use crate::model::document::DocPath;
use crate::model::review::{self, Review};
use crate::service::{ServiceContext, ServiceResult};
use crate::store::{Direction, DocumentStore, Query};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    #[serde(flatten)]
    pub review: Review,
    pub customer_display: DisplayInfo,
    pub provider_display: DisplayInfo,
}

impl Searchable for ReviewRow {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.customer_display.label.as_str(),
            self.provider_display.label.as_str(),
        ];
        fields.extend(self.review.comment.as_deref());
        fields
    }
}

/// Rating count, mean and per-star distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub count: usize,
    /// `0.0` when there are no ratings.
    pub average: f64,
    /// Index `0` counts 1-star ratings, index `4` counts 5-star ratings.
    pub distribution: [usize; 5],
}

pub fn summarize_ratings(reviews: &[Review]) -> RatingSummary {
    let mut distribution = [0usize; 5];
    let mut sum = 0u32;
    for review in reviews {
        distribution[usize::from(review.rating.clamp(1, 5) - 1)] += 1;
        sum += u32::from(review.rating);
    }
    let average = if reviews.is_empty() {
        0.0
    } else {
        round2(f64::from(sum) / reviews.len() as f64)
    };
    RatingSummary {
        count: reviews.len(),
        average,
        distribution,
    }
}

pub struct ReviewService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> ReviewService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    /// Reviews, newest first, optionally for one provider.
    pub fn reviews(&self, provider: Option<&DocPath>) -> ServiceResult<Vec<Review>> {
        let mut query = Query::collection(review::COLLECTION);
        if let Some(provider) = provider {
            query = query.where_ref("provider_id", provider);
        }
        self.ctx.load(
            &query.order_by("created_at", Direction::Descending),
            Review::from_document,
        )
    }

    pub fn list(
        &self,
        provider: Option<&DocPath>,
        search: &SearchTerm,
        page: PageRequest,
    ) -> ServiceResult<Page<ReviewRow>> {
        let reviews = self.reviews(provider)?;
        let labels = self.ctx.resolver().resolve(
            reviews
                .iter()
                .flat_map(|review| [review.customer.as_ref(), review.provider.as_ref()])
                .flatten(),
        );
        let rows = reviews
            .into_iter()
            .map(|review| ReviewRow {
                customer_display: labels.display(review.customer.as_ref()),
                provider_display: labels.display(review.provider.as_ref()),
                review,
            })
            .collect::<Vec<_>>();

        Ok(paginate(apply_search(rows, search), page))
    }

    pub fn rating_summary(&self, provider: Option<&DocPath>) -> ServiceResult<RatingSummary> {
        let reviews = match provider {
            Some(provider) => self.ctx.load(
                &Query::collection(review::COLLECTION).where_ref("provider_id", provider),
                Review::from_document,
            )?,
            None => self
                .ctx
                .load_all(review::COLLECTION, Review::from_document)?,
        };
        Ok(summarize_ratings(&reviews))
    }
}
