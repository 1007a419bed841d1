use rivet_di::{DiError, Lazy, Lifetime, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct CycleA {
    _b: Arc<CycleB>,
}

struct CycleB {
    _a: Arc<CycleA>,
}

#[test]
fn test_cycle_detection_reports_full_chain() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_ctor::<CycleA>()
        .depends_on::<CycleB>()
        .provide(|args| Ok(CycleA { _b: args.next()? }));
    sc.add_singleton_ctor::<CycleB>()
        .depends_on::<CycleA>()
        .provide(|args| Ok(CycleB { _a: args.next()? }));

    let sp = sc.build();

    match sp.get::<CycleA>() {
        Err(DiError::CyclicDependency(path)) => {
            assert_eq!(path.len(), 3);
            assert_eq!(path[0], path[2]);
            assert!(path[0].contains("CycleA"));
            assert!(path[1].contains("CycleB"));
        }
        other => panic!("expected cycle error, got ok={}", other.is_ok()),
    }

    // The resolution stack is clean afterwards: the same error is
    // reproducible and unrelated services still resolve.
    assert!(matches!(
        sp.get::<CycleA>(),
        Err(DiError::CyclicDependency(_))
    ));
}

#[test]
fn test_self_cycle_is_detected() {
    struct Narcissus {
        _me: Arc<Narcissus>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton_ctor::<Narcissus>()
        .depends_on::<Narcissus>()
        .provide(|args| Ok(Narcissus { _me: args.next()? }));

    let sp = sc.build();
    match sp.get::<Narcissus>() {
        Err(DiError::CyclicDependency(path)) => {
            assert_eq!(path.len(), 2);
            assert_eq!(path[0], path[1]);
        }
        other => panic!("expected cycle error, got ok={}", other.is_ok()),
    }
}

struct LazyA {
    b: Lazy<EagerB>,
}

struct EagerB {
    a: Arc<LazyA>,
}

#[test]
fn test_lazy_edge_breaks_cycle() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<LazyA, _>(|r| LazyA { b: r.lazy() });
    sc.add_singleton_factory::<EagerB, _>(|r| EagerB {
        a: r.get_required::<LazyA>(),
    });

    let sp = sc.build();

    // A builds without recursing into B.
    let a = sp.get_required::<LazyA>();
    assert!(!a.b.materialized());

    // First dereference materializes B, whose own A edge hits the cache.
    let b = a.b.get().unwrap();
    assert!(a.b.materialized());
    assert!(Arc::ptr_eq(&b.a, &a));

    // The proxy memoizes its target.
    assert!(Arc::ptr_eq(&b, &a.b.get().unwrap()));
}

#[test]
fn test_lazy_proxy_defers_construction() {
    static BUILDS: AtomicU32 = AtomicU32::new(0);

    struct Expensive;

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Expensive, _>(|_| {
        BUILDS.fetch_add(1, Ordering::SeqCst);
        Expensive
    });

    let sp = sc.build();
    let lazy = sp.lazy::<Expensive>();
    assert_eq!(BUILDS.load(Ordering::SeqCst), 0);

    lazy.get().unwrap();
    lazy.get().unwrap();
    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lazy_errors_are_not_memoized() {
    struct Missing;

    let sp = ServiceCollection::new().build();
    let lazy = sp.lazy::<Missing>();

    assert!(matches!(lazy.get(), Err(DiError::Unregistered(_))));
    assert!(!lazy.materialized());
}

struct ScopedSession;

struct GreedySingleton {
    _session: Arc<ScopedSession>,
}

#[test]
fn test_singleton_capturing_scoped_is_rejected() {
    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<ScopedSession, _>(|_| ScopedSession);
    sc.add_singleton_ctor::<GreedySingleton>()
        .depends_on::<ScopedSession>()
        .provide(|args| {
            Ok(GreedySingleton {
                _session: args.next()?,
            })
        });

    let sp = sc.build();
    let scope = sp.create_scope();

    match scope.get::<GreedySingleton>() {
        Err(DiError::LifecycleMismatch {
            consumer,
            consumer_lifetime,
            dependency,
            dependency_lifetime,
        }) => {
            assert!(consumer.contains("GreedySingleton"));
            assert_eq!(consumer_lifetime, Lifetime::Singleton);
            assert!(dependency.contains("ScopedSession"));
            assert_eq!(dependency_lifetime, Lifetime::Scoped);
        }
        other => panic!("expected lifecycle mismatch, got ok={}", other.is_ok()),
    }
}

#[test]
fn test_lifecycle_mismatch_fires_even_when_scoped_is_cached() {
    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<ScopedSession, _>(|_| ScopedSession);
    sc.add_singleton_ctor::<GreedySingleton>()
        .depends_on::<ScopedSession>()
        .provide(|args| {
            Ok(GreedySingleton {
                _session: args.next()?,
            })
        });

    let sp = sc.build();
    let scope = sp.create_scope();

    // Warm the scoped cache first; the capture must still be rejected.
    scope.get_required::<ScopedSession>();
    assert!(matches!(
        scope.get::<GreedySingleton>(),
        Err(DiError::LifecycleMismatch { .. })
    ));
}

#[test]
fn test_singleton_may_depend_on_transient() {
    struct Stamp(u32);
    struct Service {
        stamp: Arc<Stamp>,
    }

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Stamp, _>(|_| Stamp(COUNTER.fetch_add(1, Ordering::SeqCst)));
    sc.add_singleton_ctor::<Service>()
        .depends_on::<Stamp>()
        .provide(|args| Ok(Service {
            stamp: args.next()?,
        }));

    let sp = sc.build();
    let service = sp.get_required::<Service>();
    assert_eq!(service.stamp.0, 0);
}

#[test]
fn test_scoped_may_depend_on_singleton_and_scoped() {
    struct Database;
    struct Session;
    struct UnitOfWork {
        db: Arc<Database>,
        session: Arc<Session>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Database);
    sc.add_scoped_factory::<Session, _>(|_| Session);
    sc.add_scoped_ctor::<UnitOfWork>()
        .depends_on::<Database>()
        .depends_on::<Session>()
        .provide(|args| {
            Ok(UnitOfWork {
                db: args.next()?,
                session: args.next()?,
            })
        });

    let sp = sc.build();
    let scope = sp.create_scope();
    let uow = scope.get_required::<UnitOfWork>();

    assert!(Arc::ptr_eq(&uow.db, &sp.get_required::<Database>()));
    assert!(Arc::ptr_eq(&uow.session, &scope.get_required::<Session>()));
}
