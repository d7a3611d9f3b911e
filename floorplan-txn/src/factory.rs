//! Request factory keyed by [`RequestType`].

use crate::error::{TxnError, TxnResult};
use crate::request::Request;
use crate::requests::{
    CreateEntityRequest, PurgeRemovedRequest, RemoveEntityRequest, SetFieldRequest,
    SetFlagRequest, ShareFieldRequest, types,
};
use floorplan_types::RequestType;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Builds a request from opaque JSON arguments.
pub type RequestConstructor = Box<dyn Fn(&Value) -> TxnResult<Box<dyn Request>> + Send + Sync>;

/// Maps request type tags to constructors, as used by the command layer.
#[derive(Default)]
pub struct RequestFactory {
    constructors: HashMap<RequestType, RequestConstructor>,
}

impl RequestFactory {
    /// An empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with every built-in request that can be built from arguments.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.insert(types::SET_FIELD, |args| {
            Ok(Box::new(SetFieldRequest::from_args(args)?))
        });
        factory.insert(types::SET_FLAG, |args| {
            Ok(Box::new(SetFlagRequest::from_args(args)?))
        });
        factory.insert(types::CREATE_ENTITY, |args| {
            Ok(Box::new(CreateEntityRequest::from_args(args)?))
        });
        factory.insert(types::REMOVE_ENTITY, |args| {
            Ok(Box::new(RemoveEntityRequest::from_args(args)?))
        });
        factory.insert(types::SHARE_FIELD, |args| {
            Ok(Box::new(ShareFieldRequest::from_args(args)?))
        });
        factory.insert(types::PURGE_REMOVED, |_| {
            Ok(Box::new(PurgeRemovedRequest::new()))
        });
        factory
    }

    fn insert(
        &mut self,
        tag: &'static str,
        constructor: impl Fn(&Value) -> TxnResult<Box<dyn Request>> + Send + Sync + 'static,
    ) {
        self.constructors
            .insert(RequestType::from_static(tag), Box::new(constructor));
    }

    /// Registers a constructor.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRequestType` if the tag is already registered.
    pub fn register(
        &mut self,
        request_type: RequestType,
        constructor: impl Fn(&Value) -> TxnResult<Box<dyn Request>> + Send + Sync + 'static,
    ) -> TxnResult<()> {
        if self.constructors.contains_key(&request_type) {
            return Err(TxnError::DuplicateRequestType(request_type));
        }
        self.constructors.insert(request_type, Box::new(constructor));
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, request_type: &str) -> bool {
        self.constructors.contains_key(request_type)
    }

    /// Builds a request.
    ///
    /// # Errors
    ///
    /// `UnknownRequestType` for unregistered tags, `InvalidArgs` when the
    /// arguments do not fit the request.
    pub fn create(&self, request_type: &str, args: &Value) -> TxnResult<Box<dyn Request>> {
        let constructor = self
            .constructors
            .get(request_type)
            .ok_or_else(|| TxnError::UnknownRequestType(request_type.to_string()))?;
        constructor(args)
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn types(&self) -> Vec<&RequestType> {
        let mut types: Vec<_> = self.constructors.keys().collect();
        types.sort();
        types
    }
}

impl fmt::Debug for RequestFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestFactory")
            .field("types", &self.types())
            .finish()
    }
}
