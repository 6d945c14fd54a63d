//! Classification of declared return types.
//!
//! Shared by the metadata rewriter (build time) and the invocation handler
//! (call time), so both always agree on what is a wrapper and what its
//! payload is.

use std::any::TypeId;

use plume_core::TypeRef;

use crate::flux::Flux;
use crate::mono::Mono;
use crate::promise::Promise;
use crate::publisher::Publisher;

/// The asynchronous return shapes a method may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    /// [`Promise`]: single value, evaluation starts at invocation.
    Future,
    /// [`Mono`]: single element, evaluation deferred until awaited.
    Mono,
    /// [`Flux`]: element stream, evaluation deferred until polled.
    Flux,
    /// [`Publisher`]: the type-erased stream.
    Publisher,
}

impl WrapperKind {
    pub const ALL: [WrapperKind; 4] = [
        WrapperKind::Future,
        WrapperKind::Mono,
        WrapperKind::Flux,
        WrapperKind::Publisher,
    ];

    /// Identity of the generic declaration, shared by all its instantiations.
    pub fn decl_id(self) -> TypeId {
        match self {
            WrapperKind::Future => TypeId::of::<Promise<()>>(),
            WrapperKind::Mono => TypeId::of::<Mono<()>>(),
            WrapperKind::Flux => TypeId::of::<Flux<()>>(),
            WrapperKind::Publisher => TypeId::of::<Publisher<()>>(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WrapperKind::Future => "Promise",
            WrapperKind::Mono => "Mono",
            WrapperKind::Flux => "Flux",
            WrapperKind::Publisher => "Publisher",
        }
    }

    /// `Kind<T>` for the payload type `T`.
    pub fn of(self, payload: TypeRef) -> TypeRef {
        TypeRef::generic(self.name(), self.decl_id(), vec![payload])
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnClass<'a> {
    /// A parameterized wrapper and its payload type (the last type parameter).
    Wrapped {
        kind: WrapperKind,
        payload: &'a TypeRef,
    },
    /// Anything else, including wrappers used without a type parameter.
    Plain,
}

pub fn classify(ty: &TypeRef) -> ReturnClass<'_> {
    for kind in WrapperKind::ALL {
        if let Some(payload) = ty.last_type_param(kind.decl_id()) {
            return ReturnClass::Wrapped { kind, payload };
        }
    }
    ReturnClass::Plain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_expose_their_payload() {
        for kind in WrapperKind::ALL {
            let ty = kind.of(TypeRef::of::<Vec<String>>());
            assert_eq!(
                classify(&ty),
                ReturnClass::Wrapped {
                    kind,
                    payload: &TypeRef::of::<Vec<String>>(),
                }
            );
        }
    }

    #[test]
    fn plain_and_raw_types_are_plain() {
        assert_eq!(classify(&TypeRef::of::<String>()), ReturnClass::Plain);
        let raw = TypeRef::raw("Mono", WrapperKind::Mono.decl_id());
        assert_eq!(classify(&raw), ReturnClass::Plain);
    }

    #[test]
    fn other_generics_are_plain() {
        #[allow(dead_code)]
        struct Page<T>(T);
        let ty = TypeRef::generic(
            "Page",
            TypeId::of::<Page<()>>(),
            vec![TypeRef::of::<String>()],
        );
        assert_eq!(classify(&ty), ReturnClass::Plain);
    }

    #[test]
    fn declared_types_match_the_containers() {
        use plume_core::Returns;

        assert_eq!(
            <Mono<String> as Returns>::declared_type(),
            WrapperKind::Mono.of(TypeRef::of::<String>())
        );
        assert_eq!(
            <Promise<i32> as Returns>::declared_type().decl_id(),
            WrapperKind::Future.decl_id()
        );
    }
}
