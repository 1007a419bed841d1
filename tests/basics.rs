use rivet_di::{
    DiError, ProviderKind, Resolver, ServiceCollection, ServiceCollectionModuleExt, ServiceModule,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_concrete_singleton() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42usize);
    sc.add_singleton("hello".to_string());

    let sp = sc.build();

    let num1 = sp.get_required::<usize>();
    let num2 = sp.get_required::<usize>();
    let str1 = sp.get_required::<String>();
    let str2 = sp.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
    assert!(Arc::ptr_eq(&str1, &str2));
}

#[test]
fn test_singleton_graph_shares_instances() {
    struct Database {
        url: String,
    }

    struct UserService {
        db: Arc<Database>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Database {
        url: "postgres://localhost".to_string(),
    });
    sc.add_singleton_factory::<UserService, _>(|r| UserService {
        db: r.get_required::<Database>(),
    });

    let sp = sc.build();
    let users_a = sp.get_required::<UserService>();
    let users_b = sp.get_required::<UserService>();
    let db = sp.get_required::<Database>();

    assert_eq!(users_a.db.url, "postgres://localhost");
    assert!(Arc::ptr_eq(&users_a, &users_b));
    assert!(Arc::ptr_eq(&users_a.db, &db));
}

#[test]
fn test_transient_handlers_share_singleton_config() {
    struct Config {
        retries: u32,
    }

    struct Handler {
        config: Arc<Config>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { retries: 3 });
    sc.add_transient_factory::<Handler, _>(|r| Handler {
        config: r.get_required::<Config>(),
    });

    let sp = sc.build();
    let h1 = sp.get_required::<Handler>();
    let h2 = sp.get_required::<Handler>();

    assert!(!Arc::ptr_eq(&h1, &h2));
    assert!(Arc::ptr_eq(&h1.config, &h2.config));
    assert_eq!(h1.config.retries, 3);
}

#[test]
fn test_transient_creates_new_instances() {
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<String, _>(move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        format!("instance-{}", *c)
    });

    let sp = sc.build();
    let a = sp.get_required::<String>();
    let b = sp.get_required::<String>();

    assert_eq!(a.as_str(), "instance-1");
    assert_eq!(b.as_str(), "instance-2");
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_not_found_error() {
    struct Unregistered;

    let sp = ServiceCollection::new().build();
    assert!(matches!(
        sp.get::<Unregistered>(),
        Err(DiError::Unregistered(_))
    ));
}

#[test]
fn test_replace_semantics() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1usize);
    sc.add_singleton(2usize);

    let sp = sc.build();
    assert_eq!(*sp.get_required::<usize>(), 2);
}

#[test]
fn test_keyed_factory_and_context() {
    type ConfigMap = HashMap<String, String>;

    let mut sc = ServiceCollection::new();
    sc.add_keyed_singleton_factory::<ConfigMap, _>("db_config", |_| {
        let mut map = HashMap::new();
        map.insert("connection".to_string(), "db://".to_string());
        map.insert("pool".to_string(), "10".to_string());
        map
    });

    let sp = sc.build();

    let config = sp.get_keyed_required::<ConfigMap>("db_config");
    assert_eq!(config.get("connection").unwrap(), "db://");
    assert_eq!(config.get("pool").unwrap(), "10");

    // A different context key is a different registration.
    assert!(matches!(
        sp.get_keyed::<ConfigMap>("other"),
        Err(DiError::Unregistered(_))
    ));
    // And so is the unkeyed lookup.
    assert!(matches!(
        sp.get::<ConfigMap>(),
        Err(DiError::Unregistered(_))
    ));
}

#[test]
fn test_trait_resolution() {
    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct FixedClock(u64);
    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<dyn Clock>(Arc::new(FixedClock(1234)));

    let sp = sc.build();
    assert_eq!(sp.get_required_trait::<dyn Clock>().now(), 1234);
}

#[test]
fn test_trait_factory_with_dependencies() {
    trait Notifier: Send + Sync {
        fn channel(&self) -> String;
    }

    struct Config {
        channel: String,
    }

    struct SlackNotifier {
        channel: String,
    }
    impl Notifier for SlackNotifier {
        fn channel(&self) -> String {
            self.channel.clone()
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config {
        channel: "#alerts".to_string(),
    });
    sc.add_singleton_trait_factory::<dyn Notifier, _>(|r| {
        Arc::new(SlackNotifier {
            channel: r.get_required::<Config>().channel.clone(),
        })
    });

    let sp = sc.build();
    assert_eq!(sp.get_required_trait::<dyn Notifier>().channel(), "#alerts");
}

#[test]
fn test_constructor_form_with_optional_dependency() {
    struct Database {
        url: String,
    }
    struct Metrics;
    struct UserService {
        db: Arc<Database>,
        metrics: Option<Arc<Metrics>>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Database {
        url: "db://prod".to_string(),
    });
    sc.add_singleton_ctor::<UserService>()
        .depends_on::<Database>()
        .depends_on_optional::<Metrics>()
        .provide(|args| {
            Ok(UserService {
                db: args.next::<Database>()?,
                metrics: args.next_optional::<Metrics>()?,
            })
        });

    let sp = sc.build();
    let users = sp.get_required::<UserService>();
    assert_eq!(users.db.url, "db://prod");
    assert!(users.metrics.is_none());
}

#[test]
fn test_constructor_form_with_keyed_and_trait_dependencies() {
    trait Cache: Send + Sync {
        fn name(&self) -> &'static str;
    }
    struct MemoryCache;
    impl Cache for MemoryCache {
        fn name(&self) -> &'static str {
            "memory"
        }
    }

    struct Repo {
        port: Arc<u16>,
        cache: Arc<dyn Cache>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_keyed_singleton("db", 5432u16);
    sc.add_singleton_trait::<dyn Cache>(Arc::new(MemoryCache));
    sc.add_transient_ctor::<Repo>()
        .depends_on_keyed::<u16>("db")
        .depends_on_trait::<dyn Cache>()
        .provide(|args| {
            Ok(Repo {
                port: args.next::<u16>()?,
                cache: args.next_trait::<dyn Cache>()?,
            })
        });

    let sp = sc.build();
    let repo = sp.get_required::<Repo>();
    assert_eq!(*repo.port, 5432);
    assert_eq!(repo.cache.name(), "memory");
}

#[test]
fn test_constructor_overdraw_is_invalid_descriptor() {
    struct Widget;

    let mut sc = ServiceCollection::new();
    sc.add_transient_ctor::<Widget>().provide(|args| {
        // Draws an argument although no dependency was declared.
        let _ = args.next::<u32>()?;
        Ok(Widget)
    });

    let sp = sc.build();
    assert!(matches!(
        sp.get::<Widget>(),
        Err(DiError::InvalidDescriptor { .. })
    ));
}

#[test]
fn test_property_injection_runs_after_construction() {
    struct Logger {
        level: &'static str,
    }

    #[derive(Default)]
    struct Worker {
        logger: Option<Arc<Logger>>,
        wired: bool,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Logger { level: "debug" });
    sc.add_transient_ctor::<Worker>()
        .inject_property("logger", |worker, r| {
            worker.logger = Some(r.get::<Logger>()?);
            worker.wired = true;
            Ok(())
        })
        .provide(|_| Ok(Worker::default()));

    let sp = sc.build();
    let worker = sp.get_required::<Worker>();
    assert!(worker.wired);
    assert_eq!(worker.logger.as_ref().unwrap().level, "debug");
}

#[test]
fn test_failed_construction_is_not_cached() {
    static ATTEMPTS: AtomicU32 = AtomicU32::new(0);
    static FAIL_FIRST: AtomicBool = AtomicBool::new(true);

    struct Flaky;

    let mut sc = ServiceCollection::new();
    sc.add_singleton_try_factory::<Flaky, _>(|_| {
        ATTEMPTS.fetch_add(1, Ordering::SeqCst);
        if FAIL_FIRST.swap(false, Ordering::SeqCst) {
            Err("boom".into())
        } else {
            Ok(Flaky)
        }
    });

    let sp = sc.build();

    match sp.get::<Flaky>() {
        Err(DiError::ConstructionFailed { key, .. }) => assert!(key.contains("Flaky")),
        other => panic!("expected construction failure, got {:?}", other.is_ok()),
    }

    // The failure was not cached; the next resolution retries and succeeds.
    assert!(sp.get::<Flaky>().is_ok());
    assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_try_add_respects_existing_registrations() {
    let mut sc = ServiceCollection::new();
    assert!(sc.try_add_singleton(1usize));
    assert!(!sc.try_add_singleton(2usize));
    assert!(sc.try_add_transient_factory::<String, _>(|_| "a".to_string()));
    assert!(!sc.try_add_singleton_factory::<String, _>(|_| "b".to_string()));

    let sp = sc.build();
    assert_eq!(*sp.get_required::<usize>(), 1);
    assert_eq!(sp.get_required::<String>().as_str(), "a");
}

#[test]
fn test_module_binder() {
    struct MailConfig {
        host: &'static str,
    }
    struct Mailer {
        host: &'static str,
    }

    struct MailModule;

    impl ServiceModule for MailModule {
        fn register_services(self, services: &mut ServiceCollection) -> rivet_di::DiResult<()> {
            services.add_singleton(MailConfig { host: "smtp.local" });
            services.add_transient_factory::<Mailer, _>(|r| Mailer {
                host: r.get_required::<MailConfig>().host,
            });
            Ok(())
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_module(MailModule).unwrap();

    let sp = sc.build();
    assert_eq!(sp.get_required::<Mailer>().host, "smtp.local");
}

#[test]
fn test_service_descriptors_expose_configuration() {
    struct Database;
    struct UserService;

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Database);
    sc.add_keyed_singleton("admin", 1u8);
    sc.add_singleton_ctor::<UserService>()
        .depends_on::<Database>()
        .provide(|args| {
            let _ = args.next::<Database>()?;
            Ok(UserService)
        });

    let descriptors = sc.service_descriptors();
    assert_eq!(descriptors.len(), 3);

    let db = descriptors
        .iter()
        .find(|d| d.type_name().contains("Database"))
        .unwrap();
    assert_eq!(db.provider, ProviderKind::Instance);
    assert!(!db.async_init);

    let keyed = descriptors.iter().find(|d| d.is_keyed()).unwrap();
    assert_eq!(keyed.context_key(), Some("admin"));

    let users = descriptors
        .iter()
        .find(|d| d.type_name().contains("UserService"))
        .unwrap();
    assert_eq!(users.provider, ProviderKind::Constructor);
    assert_eq!(users.dependencies.len(), 1);
    assert!(users.dependencies[0].key.display_name().contains("Database"));
}
