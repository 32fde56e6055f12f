#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    use crate::actors::{Actor, ActorRole};
    use crate::commercial_quotes::commercial_quotes_test_utils::InMemoryQuoteRepository;
    use crate::commercial_quotes::{
        CommercialQuote, NewCommercialQuote, ProspectContact, QuoteClause, QuoteConversionInput,
        QuoteError, QuoteEventType, QuoteRenewalInput, QuoteRevisionInput, QuoteService,
        QuoteServiceTrait, QuoteStatus,
    };
    use crate::errors::Error;
    use crate::matrix::{DeliveryMode, MatrixService};
    use crate::price_lists::price_lists_test_utils::{
        admin, entry, price_list, InMemoryPriceListRepository,
    };
    use crate::price_lists::{PriceListMetadata, PriceListRepositoryTrait, PriceListStatus, PriceListType};
    use crate::pricing::PricingError;

    struct Fixture {
        service: QuoteService,
        quotes: Arc<InMemoryQuoteRepository>,
        lists: Arc<InMemoryPriceListRepository>,
    }

    fn setup() -> Fixture {
        let lists = Arc::new(InMemoryPriceListRepository::new());
        let mut master = price_list("gls-master", PriceListType::Global, "admin-1");
        master.metadata = PriceListMetadata {
            carrier_code: Some("gls".to_string()),
            contract_code: Some("GLS-5000".to_string()),
            courier_config_id: None,
        };
        lists.add_list(master);
        lists.add_entry(entry("gls-master", "IT-ITALIA", dec!(0), dec!(5), dec!(10)));
        lists.add_entry(entry("gls-master", "IT-SICILIA", dec!(0), dec!(5), dec!(12)));
        lists.add_entry(entry("gls-master", "IT-ITALIA", dec!(5), dec!(10), dec!(14)));
        lists.add_entry(entry("gls-master", "IT-SICILIA", dec!(5), dec!(10), dec!(16)));

        let quotes = Arc::new(InMemoryQuoteRepository::new());
        let service = QuoteService::new(
            quotes.clone(),
            lists.clone(),
            Arc::new(MatrixService::new(lists.clone())),
        );
        Fixture {
            service,
            quotes,
            lists,
        }
    }

    fn reseller() -> Actor {
        Actor::new("reseller-1", ActorRole::Reseller)
    }

    fn new_quote() -> NewCommercialQuote {
        NewCommercialQuote {
            prospect: ProspectContact {
                company: "Acme Srl".to_string(),
                email: Some("buyer@acme.it".to_string()),
                ..Default::default()
            },
            carrier_code: "gls".to_string(),
            contract_code: "gls-5000".to_string(),
            ..Default::default()
        }
    }

    async fn accepted_quote(fx: &Fixture) -> CommercialQuote {
        let actor = reseller();
        let quote = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        fx.service.send_quote(&actor, &quote.id).await.unwrap();
        fx.service
            .transition_quote(&actor, &quote.id, QuoteStatus::Accepted, Some("ok".to_string()))
            .await
            .unwrap()
    }

    async fn expired_quote(fx: &Fixture) -> CommercialQuote {
        let actor = reseller();
        let quote = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        fx.service.send_quote(&actor, &quote.id).await.unwrap();
        fx.service
            .expire_overdue(Utc::now() + Duration::days(31))
            .await
            .unwrap();
        fx.service.get_quote(&actor, &quote.id).unwrap()
    }

    #[tokio::test]
    async fn test_create_builds_matrix_from_contract_list() {
        let fx = setup();
        let quote = fx.service.create_quote(&reseller(), new_quote()).await.unwrap();

        assert_eq!(quote.revision, 1);
        assert_eq!(quote.parent_quote_id, None);
        assert_eq!(quote.status, QuoteStatus::Draft);
        assert_eq!(quote.price_list_id.as_deref(), Some("gls-master"));
        assert_eq!(quote.margin_percent, dec!(20));
        assert_eq!(quote.original_margin_percent, Some(dec!(20)));
        assert_eq!(quote.validity_days, 30);
        assert_eq!(quote.prospect.company, "Acme Srl");

        let matrix = &quote.price_matrix;
        assert_eq!(matrix.zone_codes, vec!["IT-ITALIA", "IT-SICILIA"]);
        assert_eq!(
            matrix.prices,
            vec![vec![dec!(12.00), dec!(14.40)], vec![dec!(16.80), dec!(19.20)]]
        );
        assert_eq!(matrix.carrier_display_name, "GLS");
        assert_eq!(quote.clauses.len(), 8);
        assert_eq!(fx.quotes.events_of(&quote.id), vec![QuoteEventType::Created]);
    }

    #[tokio::test]
    async fn test_create_checks_role_and_source_list() {
        let fx = setup();

        let plain = Actor::new("user-1", ActorRole::User);
        let err = fx.service.create_quote(&plain, new_quote()).await.unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::Unauthorized(_))));

        let mut unknown = new_quote();
        unknown.contract_code = "BRT-1".to_string();
        let err = fx.service.create_quote(&reseller(), unknown).await.unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::PriceListNotFound(_))));

        fx.lists
            .add_list(price_list("private", PriceListType::Custom, "reseller-2"));
        let mut explicit = new_quote();
        explicit.price_list_id = Some("private".to_string());
        let err = fx.service.create_quote(&reseller(), explicit).await.unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_create_with_matrix_override() {
        let fx = setup();
        let built = fx.service.create_quote(&reseller(), new_quote()).await.unwrap();

        let mut edited = built.price_matrix.clone();
        edited.prices[0][0] = dec!(9.90);
        let mut input = new_quote();
        input.price_matrix_override = Some(edited);
        let quote = fx.service.create_quote(&reseller(), input).await.unwrap();
        assert_eq!(quote.price_matrix.prices[0][0], dec!(9.90));

        let mut broken = built.price_matrix.clone();
        broken.prices.pop();
        let mut input = new_quote();
        input.price_matrix_override = Some(broken);
        let err = fx.service.create_quote(&reseller(), input).await.unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::InvalidMatrixOverride(_))));
    }

    #[tokio::test]
    async fn test_revising_accepted_quote_creates_draft_revision() {
        let fx = setup();
        let actor = reseller();
        let accepted = accepted_quote(&fx).await;

        let revision = fx
            .service
            .revise_quote(
                &actor,
                &accepted.id,
                QuoteRevisionInput {
                    revision_notes: Some("client asked for 15%".to_string()),
                    margin_percent: Some(dec!(15)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(revision.revision, 2);
        assert_eq!(revision.parent_quote_id.as_deref(), Some(accepted.id.as_str()));
        assert_eq!(revision.status, QuoteStatus::Draft);
        assert_eq!(revision.sent_at, None);
        assert_eq!(revision.original_margin_percent, Some(dec!(20)));
        assert_eq!(revision.price_matrix.prices[0][0], dec!(11.50));

        let original = fx.service.get_quote(&actor, &accepted.id).unwrap();
        assert_eq!(original.status, QuoteStatus::Accepted);
        assert!(original.sent_at.is_some());
        assert_eq!(fx.quotes.events_of(&revision.id), vec![QuoteEventType::Revised]);
    }

    #[tokio::test]
    async fn test_revision_without_margin_change_copies_matrix() {
        let fx = setup();
        let actor = reseller();
        let mut input = new_quote();
        input.clauses = Some(vec![QuoteClause::custom("Payment", "30 days end of month.")]);
        let root = fx.service.create_quote(&actor, input).await.unwrap();

        let same_terms = fx
            .service
            .revise_quote(&actor, &root.id, QuoteRevisionInput::default())
            .await
            .unwrap();
        assert_eq!(same_terms.price_matrix.prices, root.price_matrix.prices);
        assert_eq!(same_terms.clauses, root.clauses);

        let dropoff = fx
            .service
            .revise_quote(
                &actor,
                &root.id,
                QuoteRevisionInput {
                    delivery_mode: Some(DeliveryMode::ClientDropoff),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // Same margin: the snapshot is reused as it was, the quote carries the new terms.
        assert_eq!(dropoff.price_matrix, root.price_matrix);
        assert_eq!(dropoff.delivery_mode, DeliveryMode::ClientDropoff);
        assert!(dropoff.clauses.iter().any(|c| c.title == "Drop-off"));
        assert!(!dropoff.clauses.iter().any(|c| c.title == "Pickup"));
        assert_eq!(dropoff.clauses.last().map(|c| c.title.as_str()), Some("Payment"));
    }

    #[tokio::test]
    async fn test_revisions_are_monotonic_within_chain() {
        let fx = setup();
        let actor = reseller();
        let root = fx.service.create_quote(&actor, new_quote()).await.unwrap();

        let second = fx
            .service
            .revise_quote(&actor, &root.id, QuoteRevisionInput::default())
            .await
            .unwrap();
        let third = fx
            .service
            .revise_quote(&actor, &second.id, QuoteRevisionInput::default())
            .await
            .unwrap();

        assert_eq!(third.revision, 3);
        assert_eq!(third.parent_quote_id.as_deref(), Some(root.id.as_str()));
        let chain: Vec<i32> = fx
            .service
            .list_chain(&actor, &third.id)
            .unwrap()
            .iter()
            .map(|q| q.revision)
            .collect();
        assert_eq!(chain, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_revision_retries_after_concurrent_insert() {
        let fx = setup();
        let actor = reseller();
        let root = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        fx.service
            .revise_quote(&actor, &root.id, QuoteRevisionInput::default())
            .await
            .unwrap();

        fx.quotes.stale_revision_counts(1);
        let retried = fx
            .service
            .revise_quote(&actor, &root.id, QuoteRevisionInput::default())
            .await
            .unwrap();
        assert_eq!(retried.revision, 3);

        fx.quotes.stale_revision_counts(10);
        let err = fx
            .service
            .revise_quote(&actor, &root.id, QuoteRevisionInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::RevisionConflict(_))));
    }

    #[tokio::test]
    async fn test_transitions_follow_the_table() {
        let fx = setup();
        let actor = reseller();
        let quote = fx.service.create_quote(&actor, new_quote()).await.unwrap();

        let err = fx
            .service
            .transition_quote(&actor, &quote.id, QuoteStatus::Accepted, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Quote(QuoteError::InvalidTransition {
                from: QuoteStatus::Draft,
                to: QuoteStatus::Accepted
            })
        ));

        let sent = fx.service.send_quote(&actor, &quote.id).await.unwrap();
        assert_eq!(sent.status, QuoteStatus::Sent);
        let sent_at = sent.sent_at.unwrap();
        assert_eq!(sent.expires_at, Some(sent_at + Duration::days(30)));

        let negotiating = fx
            .service
            .transition_quote(&actor, &quote.id, QuoteStatus::Negotiating, None)
            .await
            .unwrap();
        assert_eq!(negotiating.status, QuoteStatus::Negotiating);

        let resent = fx.service.send_quote(&actor, &quote.id).await.unwrap();
        assert_eq!(resent.status, QuoteStatus::Sent);

        let rejected = fx
            .service
            .transition_quote(&actor, &quote.id, QuoteStatus::Rejected, Some("too expensive".to_string()))
            .await
            .unwrap();
        assert!(rejected.responded_at.is_some());
        assert_eq!(rejected.response_notes.as_deref(), Some("too expensive"));

        let err = fx.service.send_quote(&actor, &quote.id).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Quote(QuoteError::NotDraftOrNegotiating(QuoteStatus::Rejected))
        ));
        assert_eq!(
            fx.quotes.events_of(&quote.id),
            vec![
                QuoteEventType::Created,
                QuoteEventType::Sent,
                QuoteEventType::Updated,
                QuoteEventType::Sent,
                QuoteEventType::Rejected,
            ]
        );
    }

    #[tokio::test]
    async fn test_expire_overdue_only_touches_past_due_quotes() {
        let fx = setup();
        let actor = reseller();
        let sent = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        fx.service.send_quote(&actor, &sent.id).await.unwrap();
        let draft = fx.service.create_quote(&actor, new_quote()).await.unwrap();

        assert!(fx.service.expire_overdue(Utc::now()).await.unwrap().is_empty());

        let expired = fx
            .service
            .expire_overdue(Utc::now() + Duration::days(31))
            .await
            .unwrap();
        assert_eq!(expired, vec![sent.id.clone()]);
        assert_eq!(
            fx.service.get_quote(&actor, &sent.id).unwrap().status,
            QuoteStatus::Expired
        );
        assert_eq!(
            fx.service.get_quote(&actor, &draft.id).unwrap().status,
            QuoteStatus::Draft
        );
        assert!(fx
            .service
            .expire_overdue(Utc::now() + Duration::days(31))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_renew_expired_quote() {
        let fx = setup();
        let actor = reseller();

        let draft = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        let err = fx
            .service
            .renew_quote(&actor, &draft.id, QuoteRenewalInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::NotExpired(QuoteStatus::Draft))));

        let expired = expired_quote(&fx).await;
        let renewal = fx
            .service
            .renew_quote(
                &actor,
                &expired.id,
                QuoteRenewalInput {
                    margin_percent: Some(dec!(25)),
                    validity_days: Some(60),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(renewal.status, QuoteStatus::Draft);
        assert_eq!(renewal.revision, 2);
        assert_eq!(renewal.validity_days, 60);
        assert_eq!(renewal.price_matrix.prices[0][0], dec!(12.50));
        assert_eq!(renewal.revision_notes.as_deref(), Some("Renewal of expired quote"));
        assert_eq!(renewal.expires_at, None);

        let untouched = fx.service.get_quote(&actor, &expired.id).unwrap();
        assert_eq!(untouched.status, QuoteStatus::Expired);
        assert!(fx
            .quotes
            .events_of(&expired.id)
            .contains(&QuoteEventType::Renewed));
        assert_eq!(fx.quotes.events_of(&renewal.id), vec![QuoteEventType::Created]);
    }

    #[tokio::test]
    async fn test_convert_accepted_quote_into_client_list() {
        let fx = setup();
        let actor = reseller();

        let draft = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        let err = fx
            .service
            .convert_quote(
                &actor,
                &draft.id,
                QuoteConversionInput {
                    client_user_id: "client-1".to_string(),
                    price_list_name: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::NotAccepted(QuoteStatus::Draft))));

        let accepted = accepted_quote(&fx).await;
        let conversion = fx
            .service
            .convert_quote(
                &actor,
                &accepted.id,
                QuoteConversionInput {
                    client_user_id: "client-1".to_string(),
                    price_list_name: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(conversion.user_id, "client-1");
        assert_eq!(conversion.entries_created, 4);

        let list = fx.lists.list(&conversion.price_list_id).unwrap();
        assert_eq!(list.name, "Acme Srl - GLS");
        assert_eq!(list.list_type, PriceListType::Custom);
        assert_eq!(list.status, PriceListStatus::Active);
        assert_eq!(list.created_by, "reseller-1");
        assert_eq!(list.master_list_id.as_deref(), Some("gls-master"));
        assert_eq!(list.metadata.contract_code.as_deref(), Some("gls-5000"));

        let sicily = fx.lists.entries_for_zone(&list.id, "IT-SICILIA");
        assert_eq!(sicily.len(), 2);
        assert!(sicily.iter().any(|e| e.weight_to == dec!(10) && e.base_price == dec!(19.20)));
        assert_eq!(fx.lists.list_assigned("client-1").unwrap().len(), 1);

        let stored = fx.service.get_quote(&actor, &accepted.id).unwrap();
        assert_eq!(stored.converted_user_id.as_deref(), Some("client-1"));
        assert_eq!(
            stored.converted_price_list_id.as_deref(),
            Some(conversion.price_list_id.as_str())
        );

        let err = fx
            .service
            .convert_quote(
                &actor,
                &accepted.id,
                QuoteConversionInput {
                    client_user_id: "client-2".to_string(),
                    price_list_name: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::AlreadyConverted(_))));
    }

    #[tokio::test]
    async fn test_conversion_skips_missing_cells() {
        let fx = setup();
        fx.lists.add_list(price_list("sparse", PriceListType::Supplier, "reseller-1"));
        fx.lists.add_entry(entry("sparse", "IT-ITALIA", dec!(0), dec!(5), dec!(10)));
        fx.lists.add_entry(entry("sparse", "IT-SICILIA", dec!(0), dec!(5), dec!(12)));
        fx.lists.add_entry(entry("sparse", "IT-ITALIA", dec!(5), dec!(10), dec!(14)));

        let actor = reseller();
        let mut input = new_quote();
        input.price_list_id = Some("sparse".to_string());
        let quote = fx.service.create_quote(&actor, input).await.unwrap();
        assert_eq!(quote.price_matrix.missing_cells.len(), 1);
        fx.service.send_quote(&actor, &quote.id).await.unwrap();
        fx.service
            .transition_quote(&actor, &quote.id, QuoteStatus::Accepted, None)
            .await
            .unwrap();

        let conversion = fx
            .service
            .convert_quote(
                &actor,
                &quote.id,
                QuoteConversionInput {
                    client_user_id: "client-1".to_string(),
                    price_list_name: Some("Acme listino".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(conversion.entries_created, 3);
        assert_eq!(
            fx.lists.list(&conversion.price_list_id).unwrap().name,
            "Acme listino"
        );
    }

    #[tokio::test]
    async fn test_only_drafts_can_be_deleted() {
        let fx = setup();
        let actor = reseller();
        let quote = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        let sent = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        fx.service.send_quote(&actor, &sent.id).await.unwrap();

        let err = fx.service.delete_draft(&actor, &sent.id).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Quote(QuoteError::OnlyDraftDeletable(QuoteStatus::Sent))
        ));

        fx.service.delete_draft(&actor, &quote.id).await.unwrap();
        let err = fx.service.get_quote(&actor, &quote.id).unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::QuoteNotFound(_))));
    }

    #[tokio::test]
    async fn test_quotes_are_scoped_to_their_creator() {
        let fx = setup();
        let quote = fx.service.create_quote(&reseller(), new_quote()).await.unwrap();
        let other = Actor::new("reseller-2", ActorRole::Reseller);

        let err = fx.service.get_quote(&other, &quote.id).unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::QuoteNotFound(_))));
        let err = fx
            .service
            .revise_quote(&other, &quote.id, QuoteRevisionInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::QuoteNotFound(_))));

        assert!(fx.service.list_quotes(&other).unwrap().is_empty());
        assert_eq!(fx.service.list_quotes(&admin()).unwrap().len(), 1);
        assert!(fx.service.get_quote(&admin(), &quote.id).is_ok());
    }

    #[tokio::test]
    async fn test_pipeline_stats() {
        let fx = setup();
        let actor = reseller();
        accepted_quote(&fx).await;
        fx.service.create_quote(&actor, new_quote()).await.unwrap();
        let rejected = fx.service.create_quote(&actor, new_quote()).await.unwrap();
        fx.service.send_quote(&actor, &rejected.id).await.unwrap();
        fx.service
            .transition_quote(&actor, &rejected.id, QuoteStatus::Rejected, None)
            .await
            .unwrap();

        let stats = fx.service.pipeline_stats(&actor).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.draft, 1);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.conversion_rate, dec!(0.5));
    }

    fn conversion_input(client: &str) -> QuoteConversionInput {
        QuoteConversionInput {
            client_user_id: client.to_string(),
            price_list_name: None,
        }
    }

    fn custom_lists(fx: &Fixture) -> usize {
        fx.lists
            .list_all()
            .unwrap()
            .iter()
            .filter(|l| l.list_type == PriceListType::Custom)
            .count()
    }

    #[tokio::test]
    async fn test_conversion_skips_clamped_cells() {
        let fx = setup();
        fx.lists.add_list(price_list("cheap", PriceListType::Supplier, "reseller-1"));
        fx.lists.add_entry(entry("cheap", "IT-ITALIA", dec!(0), dec!(5), dec!(2)));
        fx.lists.add_entry(entry("cheap", "IT-ITALIA", dec!(5), dec!(10), dec!(20)));

        let actor = reseller();
        let mut input = new_quote();
        input.price_list_id = Some("cheap".to_string());
        input.margin_fixed_eur = Some(dec!(-5));
        let quote = fx.service.create_quote(&actor, input).await.unwrap();
        assert_eq!(quote.price_matrix.clamped_cells.len(), 1);
        assert_eq!(quote.price_matrix.prices[0][0], dec!(0));
        fx.service.send_quote(&actor, &quote.id).await.unwrap();
        fx.service
            .transition_quote(&actor, &quote.id, QuoteStatus::Accepted, None)
            .await
            .unwrap();

        let conversion = fx
            .service
            .convert_quote(&actor, &quote.id, conversion_input("client-1"))
            .await
            .unwrap();
        assert_eq!(conversion.entries_created, 1);

        let entries = fx.lists.entries_for_zone(&conversion.price_list_id, "IT-ITALIA");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].weight_from, dec!(5));
        assert_eq!(entries[0].base_price, dec!(19.00));
        assert!(entries.iter().all(|e| e.base_price > dec!(0)));
    }

    #[tokio::test]
    async fn test_losing_a_concurrent_conversion_leaves_no_client_list() {
        let fx = setup();
        let actor = reseller();
        let accepted = accepted_quote(&fx).await;
        fx.quotes.lose_conversions(1);

        let err = fx
            .service
            .convert_quote(&actor, &accepted.id, conversion_input("client-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Quote(QuoteError::AlreadyConverted(_))));

        assert_eq!(custom_lists(&fx), 0);
        assert!(fx.lists.assignments().is_empty());
        assert!(fx.lists.list_assigned("client-1").unwrap().is_empty());
        assert!(!fx
            .quotes
            .events_of(&accepted.id)
            .contains(&QuoteEventType::Converted));
    }

    #[tokio::test]
    async fn test_failed_conversion_discards_partial_client_list() {
        let fx = setup();
        let actor = reseller();
        let accepted = accepted_quote(&fx).await;
        fx.lists.fail_all_inserts();

        let err = fx
            .service
            .convert_quote(&actor, &accepted.id, conversion_input("client-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(custom_lists(&fx), 0);

        let stored = fx.service.get_quote(&actor, &accepted.id).unwrap();
        assert_eq!(stored.converted_user_id, None);
    }

    #[tokio::test]
    async fn test_revision_can_clear_fixed_margin() {
        let fx = setup();
        let actor = reseller();
        let mut input = new_quote();
        input.margin_fixed_eur = Some(dec!(2));
        let root = fx.service.create_quote(&actor, input).await.unwrap();
        assert_eq!(root.price_matrix.prices[0][0], dec!(14.00));

        let kept = fx
            .service
            .revise_quote(&actor, &root.id, QuoteRevisionInput::default())
            .await
            .unwrap();
        assert_eq!(kept.margin_fixed_eur, Some(dec!(2)));
        assert_eq!(kept.price_matrix, root.price_matrix);

        let cleared = fx
            .service
            .revise_quote(
                &actor,
                &root.id,
                QuoteRevisionInput {
                    margin_fixed_eur: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.margin_fixed_eur, None);
        assert_eq!(cleared.price_matrix.prices[0][0], dec!(12.00));
    }

    #[tokio::test]
    async fn test_renewal_can_clear_fixed_margin() {
        let fx = setup();
        let actor = reseller();
        let mut input = new_quote();
        input.margin_fixed_eur = Some(dec!(2));
        let quote = fx.service.create_quote(&actor, input).await.unwrap();
        fx.service.send_quote(&actor, &quote.id).await.unwrap();
        fx.service
            .expire_overdue(Utc::now() + Duration::days(31))
            .await
            .unwrap();

        let renewal = fx
            .service
            .renew_quote(
                &actor,
                &quote.id,
                QuoteRenewalInput {
                    margin_fixed_eur: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renewal.margin_fixed_eur, None);
        assert_eq!(renewal.price_matrix.prices[0][0], dec!(12.00));
    }
}
