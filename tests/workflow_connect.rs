mod common;

use common::{FakeProvider, create_service, unregistered_domain, verified_domain};
use newsletter_domains::domain::entities::{DomainStatus, SpfStatus};
use newsletter_domains::domain::repositories::DomainRepository;
use newsletter_domains::infrastructure::persistence::InMemoryDomainRepository;
use newsletter_domains::AppError;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_connect_invalid_name_creates_nothing() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider.clone());

    let err = service.connect(1, "invalid").await.unwrap_err();

    assert_eq!(err.to_string(), "Domain name invalid");
    assert_eq!(repo.count().await.unwrap(), 0);
    assert_eq!(provider.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connect_name_verified_elsewhere_is_claimed() {
    let repo = InMemoryDomainRepository::with_domains([verified_domain(1, 100, "example.com")]);
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider.clone());

    let err = service.connect(200, "example.com").await.unwrap_err();

    assert!(matches!(err, AppError::DomainClaimed));
    assert_eq!(err.to_string(), "Domain already in use");
    assert_eq!(repo.count().await.unwrap(), 1);
    assert_eq!(provider.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connect_blocked_by_single_success_elsewhere() {
    let mut dkim_only = unregistered_domain(1, 100, "example.com");
    dkim_only.provider_domain_id = Some("pid-1".to_string());
    dkim_only.dkim_status = DomainStatus::Success;
    assert!(!dkim_only.is_verified());

    let repo = InMemoryDomainRepository::with_domains([dkim_only]);
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider.clone());

    let err = service.connect(200, "example.com").await.unwrap_err();

    assert!(matches!(err, AppError::DomainClaimed));
    assert_eq!(repo.count().await.unwrap(), 1);
    assert_eq!(provider.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connect_rejects_repeated_root_dot() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider.clone());

    let err = service.connect(1, "example.com..").await.unwrap_err();

    assert!(matches!(err, AppError::InvalidDomain(_)));
    assert_eq!(repo.count().await.unwrap(), 0);

    let domain = service.connect(1, "example.com.").await.unwrap();
    assert_eq!(domain.name, "example.com");
}

#[tokio::test]
async fn test_second_connect_rejected() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider.clone());

    service.connect(5, "first.com").await.unwrap();
    let err = service.connect(5, "second.com").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "A domain is already connected. Disconnect it first."
    );
    assert_eq!(repo.count().await.unwrap(), 1);
    assert_eq!(provider.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fresh_connect_ends_verified() {
    let repo = InMemoryDomainRepository::new();
    let service = create_service(repo.clone(), Arc::new(FakeProvider::verified()));

    let domain = service.connect(5, "  Example.COM ").await.unwrap();

    assert_eq!(domain.name, "example.com");
    assert_eq!(domain.status, DomainStatus::Success);
    assert_eq!(domain.dkim_status, DomainStatus::Success);
    assert_eq!(domain.spf_status, SpfStatus::Success);
    assert_eq!(domain.provider_domain_id.as_deref(), Some("pid-1"));
    assert_eq!(domain.region, "us-east-1");
    assert_eq!(domain.public_key.as_deref(), Some("p=mock-key"));
    assert_eq!(domain.provider_records.len(), 3);

    let stored = repo.find_by_newsletter(5).await.unwrap().unwrap();
    assert_eq!(stored, domain);
}

#[tokio::test]
async fn test_connect_pending_when_dns_not_published() {
    let repo = InMemoryDomainRepository::new();
    let service = create_service(repo, Arc::new(FakeProvider::with_status("not_started")));

    let domain = service.connect(5, "example.com").await.unwrap();

    assert!(domain.is_registered());
    assert!(!domain.is_verified());
    assert_eq!(domain.status, DomainStatus::Pending);
    assert_eq!(domain.spf_status, SpfStatus::Pending);
}

#[tokio::test]
async fn test_provider_create_failure_leaves_no_record() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::verified());
    provider.fail_create("Resend Error");
    let service = create_service(repo.clone(), provider);

    let err = service.connect(5, "example.com").await.unwrap_err();

    assert!(matches!(err, AppError::Provider(_)));
    assert_eq!(err.to_string(), "Resend Error");
    assert_eq!(repo.count().await.unwrap(), 0);
    assert!(repo.find_by_newsletter(5).await.unwrap().is_none());
}

#[tokio::test]
async fn test_connect_after_failed_attempt_succeeds() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::verified());
    provider.fail_create("Resend Error");
    let service = create_service(repo.clone(), provider.clone());

    assert!(service.connect(5, "example.com").await.is_err());

    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider);
    let domain = service.connect(5, "example.com").await.unwrap();

    assert!(domain.is_verified());
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_sync_twice_is_idempotent() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::with_status("pending"));
    let service = create_service(repo.clone(), provider.clone());
    let connected = service.connect(5, "example.com").await.unwrap();

    provider.set_status("verified");
    let first = service.sync(connected.id).await.unwrap();
    let second = service.sync(connected.id).await.unwrap();

    assert!(first.is_verified());
    assert_eq!(first, second);
    assert_eq!(first.updated_at, second.updated_at);
}

#[tokio::test]
async fn test_sync_reflects_partial_verification() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::with_status("not_started"));
    let service = create_service(repo, provider.clone());
    let connected = service.connect(5, "example.com").await.unwrap();

    provider.set_status("temporary_failure");
    let domain = service.sync(connected.id).await.unwrap();

    assert_eq!(domain.status, DomainStatus::TemporaryFailure);
    assert_eq!(domain.dkim_status, DomainStatus::TemporaryFailure);
    assert_eq!(domain.spf_status, SpfStatus::TemporaryFailure);
    assert!(!service.verify(connected.id).await.unwrap());
}

#[tokio::test]
async fn test_unknown_provider_status_leaves_state_unchanged() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::with_status("pending"));
    let service = create_service(repo.clone(), provider.clone());
    let connected = service.connect(5, "example.com").await.unwrap();

    provider.set_status("quarantined");
    let err = service.sync(connected.id).await.unwrap_err();

    assert!(matches!(err, AppError::Provider(_)));
    let stored = repo.find_by_id(connected.id).await.unwrap().unwrap();
    assert_eq!(stored, connected);
}

#[tokio::test]
async fn test_register_or_sync_registers_unregistered_record() {
    let repo = InMemoryDomainRepository::with_domains([unregistered_domain(3, 5, "example.com")]);
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo, provider.clone());

    let domain = service.register_or_sync(3).await.unwrap();

    assert_eq!(domain.provider_domain_id.as_deref(), Some("pid-1"));
    assert!(domain.is_verified());
    assert_eq!(provider.creates.load(Ordering::SeqCst), 1);

    service.register_or_sync(3).await.unwrap();
    assert_eq!(provider.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disconnect_removes_record_and_identity() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider.clone());
    service.connect(5, "example.com").await.unwrap();

    service.disconnect(5).await.unwrap();

    assert_eq!(provider.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(repo.count().await.unwrap(), 0);

    // The name is free again, for anyone.
    service.connect(6, "example.com").await.unwrap();
}

#[tokio::test]
async fn test_disconnect_provider_failure_keeps_record() {
    let repo = InMemoryDomainRepository::new();
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider.clone());
    service.connect(5, "example.com").await.unwrap();
    provider.fail_delete("Resend Error");

    let err = service.disconnect(5).await.unwrap_err();

    assert!(matches!(err, AppError::Provider(_)));
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_disconnect_unregistered_skips_provider() {
    let repo = InMemoryDomainRepository::with_domains([unregistered_domain(3, 5, "example.com")]);
    let provider = Arc::new(FakeProvider::verified());
    let service = create_service(repo.clone(), provider.clone());

    service.disconnect(5).await.unwrap();

    assert_eq!(provider.deletes.load(Ordering::SeqCst), 0);
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_verified_and_dmarc_flag() {
    let repo = InMemoryDomainRepository::with_domains([
        verified_domain(1, 10, "b.example.com"),
        unregistered_domain(2, 20, "a.example.com"),
    ]);
    let service = create_service(repo, Arc::new(FakeProvider::verified()));

    let all = service.list_domains(false).await.unwrap();
    let verified = service.list_domains(true).await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all[0].name, "a.example.com");
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].name, "b.example.com");

    let domain = service.set_dmarc_added(10, true).await.unwrap();
    assert!(domain.dmarc_added);
    assert!(service.get_for_newsletter(10).await.unwrap().dmarc_added);
}
