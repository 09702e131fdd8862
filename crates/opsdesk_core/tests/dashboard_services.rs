mod common;

use common::{now, path, seed, seeded_store};
use opsdesk_core::model::booking::BookingStatus;
use opsdesk_core::model::coupon::CouponState;
use opsdesk_core::model::subscription::SubscriptionStatus;
use opsdesk_core::model::ticket::TicketStatus;
use opsdesk_core::service::booking_service::{BookingFilter, BookingService};
use opsdesk_core::service::coupon_service::CouponService;
use opsdesk_core::service::customer_service::CustomerService;
use opsdesk_core::service::dashboard_service::DashboardService;
use opsdesk_core::service::inventory_service::InventoryService;
use opsdesk_core::service::partner_service::PartnerService;
use opsdesk_core::service::review_service::ReviewService;
use opsdesk_core::service::subscription_service::SubscriptionService;
use opsdesk_core::service::ticket_service::TicketService;
use opsdesk_core::{
    open_db_in_memory, MemoryDocumentStore, PageRequest, SearchTerm, ServiceContext, ServiceError,
    SqliteDocumentStore,
};

fn all() -> SearchTerm {
    SearchTerm::default()
}

fn month_totals(points: &[opsdesk_core::analytics::MonthPoint]) -> Vec<(String, usize, f64)> {
    points
        .iter()
        .map(|point| (point.month.to_string(), point.count, point.total))
        .collect()
}

#[test]
fn bookings_list_filters_by_status_and_search() {
    let store = seeded_store();
    let service = BookingService::new(ServiceContext::new(&store));

    let page = service
        .list(&BookingFilter::default(), &all(), None, PageRequest::default())
        .unwrap();
    let ids = page
        .items
        .iter()
        .map(|row| row.booking.path.id())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["b7", "b5", "b3", "b1", "b2", "b4"]);

    let completed = service
        .list(
            &BookingFilter::default(),
            &all(),
            Some(&BookingStatus::Completed),
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(completed.total_items, 2);

    let sparkle = service
        .list(
            &BookingFilter::default(),
            &SearchTerm::new("sparkle"),
            None,
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(sparkle.total_items, 4);
}

#[test]
fn bookings_fall_back_when_index_is_missing() {
    let store = MemoryDocumentStore::with_index_enforcement();
    seed(&store);
    let service = BookingService::new(ServiceContext::new(&store));

    let rows = service
        .rows(&BookingFilter::for_provider(path("partners/p2")))
        .unwrap();
    let ids = rows
        .iter()
        .map(|row| row.booking.path.id())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["b5", "b2", "b6"]);
    assert_eq!(rows[2].booking.status, BookingStatus::InProgress);
}

#[test]
fn booking_status_counts_keep_bookings_with_malformed_amounts() {
    let store = seeded_store();
    let counts = BookingService::new(ServiceContext::new(&store))
        .status_counts(&BookingFilter::for_provider(path("partners/p1")))
        .unwrap();

    assert_eq!(counts.get("completed"), Some(&2));
    assert_eq!(counts.get("confirmed"), Some(&2));
    assert_eq!(counts.values().sum::<usize>(), 4);
}

#[test]
fn customer_rows_carry_booking_counts_and_active_plan() {
    let store = seeded_store();
    let page = CustomerService::new(ServiceContext::new(&store))
        .list(&all(), PageRequest::default(), now())
        .unwrap();

    let row = |id: &str| {
        page.items
            .iter()
            .find(|row| row.customer.path.id() == id)
            .unwrap()
    };
    assert_eq!(row("c1").booking_count, 3);
    assert_eq!(row("c1").active_plan.as_deref(), Some("Gold"));
    assert_eq!(row("c2").booking_count, 2);
    assert_eq!(row("c2").active_plan, None);
    assert_eq!(row("c3").active_plan.as_deref(), Some("Silver"));
    assert_eq!(row("c4").label, "Unknown");
}

#[test]
fn customer_detail_sums_completed_bookings_only() {
    let store = seeded_store();
    let service = CustomerService::new(ServiceContext::new(&store));

    let detail = service.detail(&path("customer/c1")).unwrap();
    assert_eq!(detail.label, "Asha Kumar");
    assert_eq!(detail.bookings.len(), 3);
    assert_eq!(detail.total_spent, 1500.0);
    assert_eq!(detail.subscriptions.len(), 1);
    assert_eq!(detail.reviews.len(), 2);

    let err = service.detail(&path("customer/ghost")).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(missing) if missing.id() == "ghost"));
}

#[test]
fn customer_detail_agrees_with_list_on_undated_bookings() {
    let store = MemoryDocumentStore::with_index_enforcement();
    seed(&store);
    let service = CustomerService::new(ServiceContext::new(&store));

    let listed = service
        .list(&SearchTerm::new("Ravi"), PageRequest::default(), now())
        .unwrap();
    let detail = service.detail(&path("customer/c2")).unwrap();

    let ids = detail
        .bookings
        .iter()
        .map(|row| row.booking.path.id())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["b3", "b6"]);
    assert_eq!(listed.items[0].booking_count, detail.bookings.len());
    assert_eq!(detail.bookings[1].provider_display.label, "BugBusters");
}

#[test]
fn partner_rows_join_wallets_jobs_and_ratings() {
    let store = seeded_store();
    let service = PartnerService::new(ServiceContext::new(&store));
    let page = service.list(&all(), PageRequest::default()).unwrap();

    let labels = page
        .items
        .iter()
        .map(|row| row.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["BugBusters", "Sparkle Cleaners"]);

    let sparkle = &page.items[1];
    assert_eq!(sparkle.wallet_balance, 1200.5);
    assert_eq!(sparkle.completed_jobs, 2);
    assert_eq!(sparkle.average_rating, Some(4.5));

    let bug_busters = &page.items[0];
    assert_eq!(bug_busters.wallet_balance, 300.0);
    assert_eq!(bug_busters.completed_jobs, 0);
    assert_eq!(bug_busters.average_rating, Some(2.0));

    let wallet = service.wallet(&path("partners/p2")).unwrap().unwrap();
    assert_eq!(wallet.balance, 300.0);
    assert!(service.wallet(&path("partners/p9")).unwrap().is_none());
}

#[test]
fn review_summary_per_provider() {
    let store = seeded_store();
    let service = ReviewService::new(ServiceContext::new(&store));

    let summary = service.rating_summary(Some(&path("partners/p1"))).unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.average, 4.5);
    assert_eq!(summary.distribution, [0, 0, 0, 1, 1]);

    let page = service
        .list(None, &SearchTerm::new("late"), PageRequest::default())
        .unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].customer_display.label, "Asha Kumar");
}

#[test]
fn subscriptions_by_status_and_month() {
    let store = seeded_store();
    let service = SubscriptionService::new(ServiceContext::new(&store));

    let active = service
        .list(
            Some(&SubscriptionStatus::Active),
            &all(),
            PageRequest::default(),
            now(),
        )
        .unwrap();
    let ids = active
        .items
        .iter()
        .map(|row| row.subscription.path.id())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["s1", "s3"]);
    assert!(active.items.iter().all(|row| row.is_active));

    assert_eq!(service.active_count(now()).unwrap(), 2);
    assert_eq!(
        month_totals(&service.revenue_by_month(now(), 3).unwrap()),
        vec![
            ("2024-03".to_string(), 0, 0.0),
            ("2024-04".to_string(), 1, 499.0),
            ("2024-05".to_string(), 1, 999.0),
        ]
    );
}

#[test]
fn inventory_spend_and_totals() {
    let store = seeded_store();
    let service = InventoryService::new(ServiceContext::new(&store));

    let page = service
        .list(Some(&path("partners/p1")), &all(), PageRequest::default())
        .unwrap();
    assert_eq!(page.total_items, 2);
    assert_eq!(page.items[0].cost, 1200.0);
    assert_eq!(page.items[0].partner_display.label, "Sparkle Cleaners");

    assert_eq!(
        month_totals(&service.spend_by_month(now(), 2).unwrap()),
        vec![
            ("2024-04".to_string(), 2, 2400.0),
            ("2024-05".to_string(), 1, 1200.0),
        ]
    );

    let totals = service.totals_by_chemical().unwrap();
    let floor = totals.get("Floor cleaner").unwrap();
    assert_eq!(floor.purchases, 2);
    assert_eq!(floor.quantity, 15.0);
    assert_eq!(floor.spend, 1800.0);
}

#[test]
fn tickets_newest_first_with_status_counts() {
    let store = seeded_store();
    let service = TicketService::new(ServiceContext::new(&store));

    let page = service.list(None, &all(), PageRequest::default()).unwrap();
    let ids = page
        .items
        .iter()
        .map(|row| row.ticket.path.id())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["t3", "t1", "t2"]);

    let open = service
        .list(Some(&TicketStatus::Open), &all(), PageRequest::default())
        .unwrap();
    assert_eq!(open.total_items, 1);
    assert_eq!(open.items[0].customer_display.label, "Asha Kumar");

    let counts = service.status_counts().unwrap();
    assert_eq!(counts.get("in_progress"), Some(&1));
    assert_eq!(counts.get("resolved"), Some(&1));
}

#[test]
fn coupon_states_are_computed_at_now() {
    let store = seeded_store();
    let service = CouponService::new(ServiceContext::new(&store));

    let page = service
        .list(None, &all(), PageRequest::default(), now())
        .unwrap();
    let states = page
        .items
        .iter()
        .map(|row| (row.coupon.code.as_str(), row.state))
        .collect::<Vec<_>>();
    assert_eq!(
        states,
        vec![
            ("FLAT200", CouponState::Exhausted),
            ("LAUNCH", CouponState::Disabled),
            ("SUMMER10", CouponState::Active),
            ("WINTER", CouponState::Expired),
        ]
    );

    let active = service
        .list(Some(CouponState::Active), &all(), PageRequest::default(), now())
        .unwrap();
    assert_eq!(active.total_items, 1);
    assert_eq!(active.items[0].usage_percent, Some(25.0));
    assert_eq!(active.items[0].discount_label, "10%");
}

#[test]
fn kpis_over_sqlite_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    seed(&store);
    let service = DashboardService::new(ServiceContext::new(&store));

    let kpis = service.kpis(now()).unwrap();
    assert_eq!(kpis.total_customers, 4);
    assert_eq!(kpis.new_customers_this_month, 2);
    assert_eq!(kpis.total_bookings, 7);
    assert_eq!(kpis.bookings_this_month, 4);
    assert_eq!(kpis.completed_bookings, 2);
    assert_eq!(kpis.completion_rate, 28.57);
    assert_eq!(kpis.cancellation_rate, 14.29);
    assert_eq!(kpis.completed_revenue, 2400.0);
    assert_eq!(kpis.active_subscriptions, 2);
    assert_eq!(kpis.open_tickets, 2);
    assert_eq!(kpis.average_rating, Some(3.67));

    assert_eq!(
        month_totals(&service.monthly_bookings(now(), 3).unwrap()),
        vec![
            ("2024-03".to_string(), 1, 900.0),
            ("2024-04".to_string(), 1, 800.0),
            ("2024-05".to_string(), 4, 4100.0),
        ]
    );
}
