use rivet_di::{DiError, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

trait EmailSender: Send + Sync {
    fn send(&self, to: &str);
}

struct SmtpSender;
impl EmailSender for SmtpSender {
    fn send(&self, _to: &str) {
        panic!("real sender must not run under test mode");
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<String>>,
}

impl EmailSender for RecordingSender {
    fn send(&self, to: &str) {
        self.sent.lock().unwrap().push(to.to_string());
    }
}

struct UserService {
    email: Arc<dyn EmailSender>,
}

impl UserService {
    fn register_user(&self, name: &str) {
        self.email.send(name);
    }
}

#[test]
fn test_mock_records_interactions() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<dyn EmailSender>(Arc::new(SmtpSender));
    sc.add_transient_factory::<UserService, _>(|r| UserService {
        email: r.get_required_trait::<dyn EmailSender>(),
    });

    let sp = sc.build();
    sp.enable_test_mode();

    let recorder = Arc::new(RecordingSender::default());
    sp.mock_trait::<dyn EmailSender>(recorder.clone());

    let users = sp.get_required::<UserService>();
    users.register_user("x");

    assert_eq!(*recorder.sent.lock().unwrap(), vec!["x".to_string()]);
    sp.disable_test_mode();
}

#[test]
fn test_mock_shadowing_and_restore() {
    static BUILDS: AtomicU32 = AtomicU32::new(0);

    struct ApiClient {
        base: &'static str,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<ApiClient, _>(|_| {
        BUILDS.fetch_add(1, Ordering::SeqCst);
        ApiClient { base: "real" }
    });

    let sp = sc.build();
    sp.enable_test_mode();
    sp.mock(ApiClient { base: "mock" });

    // The mock shadows the registration; the real factory never runs.
    assert_eq!(sp.get_required::<ApiClient>().base, "mock");
    assert_eq!(BUILDS.load(Ordering::SeqCst), 0);

    sp.disable_test_mode();

    // After test mode, a real instance is built.
    assert_eq!(sp.get_required::<ApiClient>().base, "real");
    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unmock_restores_real_registration_while_in_test_mode() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(10u32);

    let sp = sc.build();
    sp.enable_test_mode();
    sp.mock(99u32);
    assert_eq!(*sp.get_required::<u32>(), 99);

    sp.unmock::<u32>();
    assert_eq!(*sp.get_required::<u32>(), 10);
    sp.disable_test_mode();
}

#[test]
fn test_mock_derived_singletons_are_evicted() {
    static BUILDS: AtomicU32 = AtomicU32::new(0);

    struct Config {
        source: &'static str,
    }

    struct Reporter {
        source: &'static str,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { source: "real" });
    sc.add_singleton_factory::<Reporter, _>(|r| {
        BUILDS.fetch_add(1, Ordering::SeqCst);
        Reporter {
            source: r.get_required::<Config>().source,
        }
    });

    let sp = sc.build();
    sp.enable_test_mode();
    sp.mock(Config { source: "mock" });

    // Reporter is a real singleton built on top of a mocked dependency.
    let mocked_reporter = sp.get_required::<Reporter>();
    assert_eq!(mocked_reporter.source, "mock");
    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);

    sp.disable_test_mode();

    // The mock-derived cache entry was evicted; a fresh real instance is built.
    let real_reporter = sp.get_required::<Reporter>();
    assert_eq!(real_reporter.source, "real");
    assert_eq!(BUILDS.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&mocked_reporter, &real_reporter));
}

#[test]
fn test_real_singletons_survive_test_mode_transitions() {
    struct Catalog;
    struct Stub;

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Catalog, _>(|_| Catalog);
    sc.add_singleton(Stub);

    let sp = sc.build();

    // Built before test mode: a real entry.
    let before = sp.get_required::<Catalog>();

    sp.enable_test_mode();
    sp.mock(Stub);
    // Mocks shadow at lookup; the real cache is untouched.
    assert!(Arc::ptr_eq(&before, &sp.get_required::<Catalog>()));
    sp.disable_test_mode();

    // Disabling evicts only mock-derived entries.
    assert!(Arc::ptr_eq(&before, &sp.get_required::<Catalog>()));
}

#[test]
fn test_keyed_mocks() {
    let mut sc = ServiceCollection::new();
    sc.add_keyed_singleton("primary", "real-primary".to_string());

    let sp = sc.build();
    sp.enable_test_mode();
    sp.mock_keyed("primary", "mock-primary".to_string());
    sp.mock_keyed("extra", "mock-extra".to_string());

    assert_eq!(
        sp.get_keyed_required::<String>("primary").as_str(),
        "mock-primary"
    );
    // A mock can even stand in for a key that was never registered.
    assert_eq!(
        sp.get_keyed_required::<String>("extra").as_str(),
        "mock-extra"
    );

    sp.disable_test_mode();
    assert_eq!(
        sp.get_keyed_required::<String>("primary").as_str(),
        "real-primary"
    );
    assert!(matches!(
        sp.get_keyed::<String>("extra"),
        Err(DiError::Unregistered(_))
    ));
}

#[test]
fn test_mocks_apply_inside_scopes() {
    struct Session {
        token: &'static str,
    }

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Session, _>(|_| Session { token: "real" });

    let sp = sc.build();
    sp.enable_test_mode();
    sp.mock(Session { token: "mock" });

    let scope = sp.create_scope();
    assert_eq!(scope.get_required::<Session>().token, "mock");

    sp.disable_test_mode();
    let scope = sp.create_scope();
    assert_eq!(scope.get_required::<Session>().token, "real");
}
