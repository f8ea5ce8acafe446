//! In-memory CRUD object store

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crud_codec::{CrudRequest, ObjectId, RequestFlags, RequestResult, RequestType, MAX_LENGTH};

/// One request as seen by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRecord {
    pub request_type: RequestType,
    /// Object named in the request header
    pub requested_id: ObjectId,
    /// Object the store resolved and answered with
    pub object_id: ObjectId,
    pub length: u32,
    pub flags: RequestFlags,
    pub success: bool,
}

#[derive(Debug)]
struct StoreState {
    objects: BTreeMap<i32, Vec<u8>>,
    next_id: i32,
    priority: Option<i32>,
    session_active: bool,
    connections: usize,
    injected_failures: VecDeque<RequestType>,
    log: Vec<ExchangeRecord>,
}

impl StoreState {
    fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 1,
            priority: None,
            session_active: false,
            connections: 0,
            injected_failures: VecDeque::new(),
            log: Vec::new(),
        }
    }

    fn take_injected_failure(&mut self, request_type: RequestType) -> bool {
        match self
            .injected_failures
            .iter()
            .position(|injected| *injected == request_type)
        {
            Some(index) => {
                self.injected_failures.remove(index);
                true
            }
            None => false,
        }
    }

    fn resolve(&self, request: &CrudRequest) -> Option<i32> {
        if request.flags().contains(RequestFlags::PRIORITY_OBJECT) {
            return self.priority;
        }
        let id = request.object_id().as_raw();
        self.objects.contains_key(&id).then_some(id)
    }

    fn apply(&mut self, request: &CrudRequest, payload: &[u8]) -> Option<(CrudRequest, Vec<u8>)> {
        let request_type = request.request_type();
        if request_type != RequestType::Init && !self.session_active {
            return None;
        }

        match request_type {
            RequestType::Init => {
                self.session_active = true;
                Some((CrudRequest::control(RequestType::Init), Vec::new()))
            }
            RequestType::Format => {
                self.objects.clear();
                self.priority = None;
                Some((CrudRequest::control(RequestType::Format), Vec::new()))
            }
            RequestType::Create => {
                let priority = request.flags().contains(RequestFlags::PRIORITY_OBJECT);
                if payload.is_empty() || (priority && self.priority.is_some()) {
                    return None;
                }
                let id = self.next_id;
                self.next_id = self.next_id.checked_add(1)?;
                self.objects.insert(id, payload.to_vec());
                if priority {
                    self.priority = Some(id);
                }
                Some((
                    reply(request_type, id, payload.len(), request.flags()),
                    Vec::new(),
                ))
            }
            RequestType::Read => {
                let id = self.resolve(request)?;
                let data = self.objects.get(&id)?;
                if (request.length() as usize) < data.len() {
                    return None;
                }
                Some((
                    reply(request_type, id, data.len(), request.flags()),
                    data.clone(),
                ))
            }
            RequestType::Update => {
                let id = self.resolve(request)?;
                let data = self.objects.get_mut(&id)?;
                if data.len() != payload.len() {
                    return None;
                }
                data.copy_from_slice(payload);
                Some((
                    reply(request_type, id, payload.len(), request.flags()),
                    Vec::new(),
                ))
            }
            RequestType::Delete => {
                let id = self.resolve(request)?;
                self.objects.remove(&id);
                if self.priority == Some(id) {
                    self.priority = None;
                }
                Some((reply(request_type, id, 0, request.flags()), Vec::new()))
            }
            RequestType::Close => {
                self.session_active = false;
                Some((CrudRequest::control(RequestType::Close), Vec::new()))
            }
        }
    }
}

fn reply(request_type: RequestType, id: i32, length: usize, flags: RequestFlags) -> CrudRequest {
    let length = length.min(MAX_LENGTH as usize) as u32;
    CrudRequest::new(ObjectId::new(id), request_type, length, flags)
        .unwrap_or_else(|_| failure(request_type, ObjectId::new(id)))
}

fn failure(request_type: RequestType, object_id: ObjectId) -> CrudRequest {
    CrudRequest::new(object_id, request_type, 0, RequestFlags::empty())
        .unwrap_or_else(|_| CrudRequest::control(request_type))
        .with_result(RequestResult::Failure)
}

/// Shared handle to a simulated object store.
///
/// Clones refer to the same store, so a test can keep one handle for
/// inspection while a transport owns another.
#[derive(Debug, Clone)]
pub struct SimServer {
    state: Arc<Mutex<StoreState>>,
}

impl Default for SimServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimServer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes one request and returns the response header and payload
    pub fn handle(&self, request: &CrudRequest, payload: &[u8]) -> (CrudRequest, Vec<u8>) {
        let mut state = self.state();
        let request_type = request.request_type();

        let outcome = if state.take_injected_failure(request_type) {
            None
        } else {
            state.apply(request, payload)
        };

        let (response, data) = outcome
            .unwrap_or_else(|| (failure(request_type, request.object_id()), Vec::new()));
        state.log.push(ExchangeRecord {
            request_type,
            requested_id: request.object_id(),
            object_id: response.object_id(),
            length: request.length(),
            flags: request.flags(),
            success: response.result().is_success(),
        });
        log::debug!("sim store: {} -> {}", request, response);

        (response, data)
    }

    /// Makes the next request of `request_type` fail
    pub fn fail_next(&self, request_type: RequestType) {
        self.state().injected_failures.push_back(request_type);
    }

    pub(crate) fn note_connection(&self) {
        self.state().connections += 1;
    }

    /// Number of connections accepted so far
    pub fn connections(&self) -> usize {
        self.state().connections
    }

    pub fn is_session_active(&self) -> bool {
        self.state().session_active
    }

    /// Returns a copy of an object's bytes
    pub fn object(&self, id: ObjectId) -> Option<Vec<u8>> {
        self.state().objects.get(&id.as_raw()).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }

    pub fn priority_object(&self) -> Option<ObjectId> {
        self.state().priority.map(ObjectId::new)
    }

    /// Every request handled so far, oldest first
    pub fn exchanges(&self) -> Vec<ExchangeRecord> {
        self.state().log.clone()
    }

    /// Request types handled so far, oldest first
    pub fn request_types(&self) -> Vec<RequestType> {
        self.state().log.iter().map(|record| record.request_type).collect()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }
}
