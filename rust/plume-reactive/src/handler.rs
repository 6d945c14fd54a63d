//! Invocation handler that delivers results through the declared container.

use std::any::Any;
use std::sync::Arc;

use plume_core::{
    Args, DispatchTable, InvocationHandler, InvocationHandlerFactory, MethodDecl, MethodHandler,
    Payload, PlumeError, Target,
};
use tracing::trace;

use crate::classify::{ReturnClass, WrapperKind, classify};
use crate::flux::Flux;
use crate::mono::Mono;

/// Routes calls by their declared return type.
///
/// | declared        | delivered                                   |
/// |-----------------|---------------------------------------------|
/// | `Mono<T>`       | deferred `Mono`, request sent when awaited  |
/// | `Publisher<T>`  | deferred, converted to a `Publisher`        |
/// | `Flux<T>`       | deferred single-element `Flux`              |
/// | `Promise<T>`    | request started now, `Promise` returned     |
/// | anything else   | synchronous call, result returned as is     |
///
/// The classification looks at the return type as declared on the interface,
/// never at the rewritten metadata.
pub struct ReactiveInvocationHandler {
    target: Arc<dyn Target>,
    dispatch: Arc<DispatchTable>,
}

impl ReactiveInvocationHandler {
    pub fn new(target: Arc<dyn Target>, dispatch: Arc<DispatchTable>) -> Self {
        Self { target, dispatch }
    }

    pub fn factory() -> impl InvocationHandlerFactory {
        |target: Arc<dyn Target>, dispatch: Arc<DispatchTable>| -> Arc<dyn InvocationHandler> {
            Arc::new(ReactiveInvocationHandler::new(target, dispatch))
        }
    }

    fn method_handler(&self, method: &MethodDecl) -> Result<Arc<dyn MethodHandler>, PlumeError> {
        self.dispatch
            .get(method.name)
            .cloned()
            .ok_or_else(|| PlumeError::UnknownMethod {
                api: self.target.api().to_string(),
                method: method.name.to_string(),
            })
    }

    /// A fresh, un-started call of `method`. Failures, including a missing
    /// handler, are delivered through the mono.
    fn create_mono(&self, method: &MethodDecl, args: Args) -> Mono<Payload> {
        match self.method_handler(method) {
            Ok(handler) => Mono::defer(move || handler.invoke(args)),
            Err(e) => Mono::error(e),
        }
    }
}

impl InvocationHandler for ReactiveInvocationHandler {
    fn invoke(&self, method: &MethodDecl, args: Args) -> Result<Payload, PlumeError> {
        let kind = match classify(&method.return_type) {
            ReturnClass::Wrapped { kind, .. } => kind,
            ReturnClass::Plain => return self.method_handler(method)?.invoke(args),
        };
        trace!(method = method.name, ?kind, "deferring call");
        let mono = self.create_mono(method, args);
        let container: Payload = match kind {
            WrapperKind::Flux => Box::new(Flux::from_mono(mono)),
            WrapperKind::Mono | WrapperKind::Publisher => Box::new(mono),
            WrapperKind::Future => Box::new(mono.to_future()),
        };
        Ok(container)
    }

    fn target(&self) -> &Arc<dyn Target> {
        &self.target
    }

    fn equals(&self, other: &dyn InvocationHandler) -> bool {
        other
            .as_any()
            .downcast_ref::<ReactiveInvocationHandler>()
            .is_some_and(|other| self.target.eq_target(other.target.as_ref()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    use plume_core::{
        DefaultInvocationHandler, HardCodedTarget, Proxy, Returns, TypeRef, downcast_payload,
    };

    use super::*;
    use crate::promise::Promise;
    use crate::publisher::Publisher;

    /// Answers every call with a fixed value and counts the calls.
    struct Counting {
        calls: AtomicUsize,
        answer: fn() -> Result<Payload, PlumeError>,
    }

    impl MethodHandler for Counting {
        fn invoke(&self, _args: Args) -> Result<Payload, PlumeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.answer)()
        }
    }

    fn foo() -> Result<Payload, PlumeError> {
        Ok(Box::new("foo".to_string()))
    }

    fn list() -> Result<Payload, PlumeError> {
        Ok(Box::new(vec!["foo".to_string(), "bar".to_string()]))
    }

    fn answer() -> Result<Payload, PlumeError> {
        Ok(Box::new(42_i32))
    }

    fn failure() -> Result<Payload, PlumeError> {
        Err(PlumeError::Config("server went away".into()))
    }

    struct Fixture {
        proxy: Proxy,
        handler: Arc<Counting>,
    }

    impl Fixture {
        fn new(declared: TypeRef, answer: fn() -> Result<Payload, PlumeError>) -> Self {
            Self::at("http://localhost", declared, answer)
        }

        fn at(url: &str, declared: TypeRef, answer: fn() -> Result<Payload, PlumeError>) -> Self {
            let handler = Arc::new(Counting {
                calls: AtomicUsize::new(0),
                answer,
            });
            let mut dispatch = DispatchTable::new();
            dispatch.insert("call", handler.clone() as Arc<dyn MethodHandler>);
            let target: Arc<dyn Target> = Arc::new(HardCodedTarget::new("Api", url));
            let invocation =
                ReactiveInvocationHandler::factory().create(target, Arc::new(dispatch));
            let mut methods = HashMap::new();
            methods.insert("call", MethodDecl::new("call", declared));
            Self {
                proxy: Proxy::new("Api", Arc::new(methods), invocation),
                handler,
            }
        }

        fn calls(&self) -> usize {
            self.handler.calls.load(Ordering::SeqCst)
        }

        fn call<R: Returns>(&self) -> R {
            self.proxy.call("call", Args::new())
        }
    }

    #[tokio::test]
    async fn mono_calls_are_deferred_until_awaited() {
        let fixture = Fixture::new(<Mono<String> as Returns>::declared_type(), foo);
        let mono: Mono<String> = fixture.call();
        assert_eq!(fixture.calls(), 0);
        assert_eq!(mono.await.unwrap(), "foo");
        assert_eq!(fixture.calls(), 1);

        let second: Mono<String> = fixture.call();
        second.await.unwrap();
        assert_eq!(fixture.calls(), 2);
    }

    #[tokio::test]
    async fn flux_delivers_the_whole_payload_as_one_element() {
        use futures::StreamExt;

        let fixture = Fixture::new(<Flux<Vec<String>> as Returns>::declared_type(), list);
        let flux: Flux<Vec<String>> = fixture.call();
        assert_eq!(fixture.calls(), 0);
        let items: Vec<_> = flux.collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].as_ref().unwrap(),
            &vec!["foo".to_string(), "bar".to_string()]
        );
        assert_eq!(fixture.calls(), 1);
    }

    #[tokio::test]
    async fn publisher_calls_are_deferred() {
        use futures::StreamExt;

        let fixture = Fixture::new(<Publisher<String> as Returns>::declared_type(), foo);
        let publisher: Publisher<String> = fixture.call();
        assert_eq!(fixture.calls(), 0);
        let items: Vec<_> = publisher.collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(fixture.calls(), 1);
    }

    #[test]
    fn promise_work_starts_at_invocation() {
        let fixture = Fixture::new(<Promise<i32> as Returns>::declared_type(), answer);
        let promise: Promise<i32> = fixture.call();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while fixture.calls() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(fixture.calls(), 1);
        assert_eq!(promise.get().unwrap(), 42);
        assert_eq!(fixture.calls(), 1);
    }

    #[test]
    fn promise_invocation_does_not_block() {
        struct Gate(std::sync::Mutex<mpsc::Receiver<()>>);

        impl MethodHandler for Gate {
            fn invoke(&self, _args: Args) -> Result<Payload, PlumeError> {
                let _ = self.0.lock().unwrap().recv();
                Ok(Box::new(7_i32))
            }
        }

        let (open, gate) = mpsc::channel();
        let mut dispatch = DispatchTable::new();
        dispatch.insert(
            "call",
            Arc::new(Gate(std::sync::Mutex::new(gate))) as Arc<dyn MethodHandler>,
        );
        let handler = ReactiveInvocationHandler::new(
            Arc::new(HardCodedTarget::new("Api", "http://localhost")),
            Arc::new(dispatch),
        );
        let method = MethodDecl::new("call", <Promise<i32> as Returns>::declared_type());

        // Returns while the handler is still blocked on the gate.
        let promise: Promise<i32> = Promise::from_invocation(handler.invoke(&method, Args::new()));
        open.send(()).unwrap();
        assert_eq!(promise.get().unwrap(), 7);
    }

    #[test]
    fn plain_calls_are_synchronous() {
        let fixture = Fixture::new(TypeRef::of::<String>(), foo);
        let payload = fixture.proxy.invoke("call", Args::new()).unwrap();
        assert_eq!(fixture.calls(), 1);
        assert_eq!(downcast_payload::<String>(payload).unwrap(), "foo");
    }

    #[test]
    fn raw_wrappers_are_plain() {
        let raw = TypeRef::raw("Mono", WrapperKind::Mono.decl_id());
        let fixture = Fixture::new(raw, foo);
        fixture.proxy.invoke("call", Args::new()).unwrap();
        assert_eq!(fixture.calls(), 1);
    }

    #[test]
    fn failures_use_the_container_channel() {
        let fixture = Fixture::new(<Mono<String> as Returns>::declared_type(), failure);
        let mono: Mono<String> = fixture.call();
        match mono.block() {
            Err(PlumeError::Config(msg)) => assert_eq!(msg, "server went away"),
            other => panic!("expected the handler's error, got {other:?}"),
        }

        let plain = Fixture::new(TypeRef::of::<String>(), failure);
        let result: Result<String, PlumeError> = plain.call();
        assert!(matches!(result, Err(PlumeError::Config(_))));
    }

    #[test]
    fn identity_follows_the_target() {
        let a = Fixture::new(TypeRef::of::<String>(), foo);
        let b = Fixture::new(TypeRef::of::<String>(), answer);
        let c = Fixture::at("http://elsewhere", TypeRef::of::<String>(), foo);

        assert_eq!(a.proxy, b.proxy);
        assert_eq!(a.proxy.hash_code(), b.proxy.hash_code());
        assert_eq!(a.proxy.to_string(), b.proxy.to_string());
        assert_ne!(a.proxy, c.proxy);
        assert!(!a.proxy.equals_any(a.proxy.target().as_any()));
        assert!(!a.proxy.equals_any(&"http://localhost"));
    }

    #[test]
    fn never_equal_to_a_synchronous_proxy() {
        let reactive = Fixture::new(TypeRef::of::<String>(), foo);
        let target = reactive.proxy.target().clone();
        let sync = Proxy::new(
            "Api",
            Arc::new(HashMap::new()),
            DefaultInvocationHandler::factory().create(target, Arc::new(DispatchTable::new())),
        );
        assert_ne!(reactive.proxy, sync);
        assert_eq!(reactive.proxy.hash_code(), sync.hash_code());
    }
}
