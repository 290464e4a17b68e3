//! Named callback slots shared between the overlay and the host.
//!
//! Every handler is reachable under two addresses at once: a legacy flat name
//! (`updateStats`) and the namespaced table (`Bridge.v1.updateStats`). Both are
//! installed and torn down together through a [`Registration`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, trace};

pub const BRIDGE_NAMESPACE: &str = "Bridge";
pub const BRIDGE_VERSION: &str = "v1";

/// Single argument passed across the bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeArg {
    Empty,
    Text(String),
    Flag(bool),
}

impl BridgeArg {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BridgeArg::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Booleans, also accepting the literal strings `true` / `false`.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            BridgeArg::Flag(flag) => Some(*flag),
            BridgeArg::Text(text) => text.parse().ok(),
            BridgeArg::Empty => None,
        }
    }

    /// Maps a decoded JSON value onto a bridge argument.
    ///
    /// Strings pass through untouched; objects and arrays are re-encoded, since
    /// the host always hands JSON payloads over as strings.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => BridgeArg::Empty,
            Value::Bool(flag) => BridgeArg::Flag(*flag),
            Value::String(text) => BridgeArg::Text(text.clone()),
            other => BridgeArg::Text(other.to_string()),
        }
    }
}

impl From<&str> for BridgeArg {
    fn from(text: &str) -> Self {
        BridgeArg::Text(text.to_owned())
    }
}

impl From<bool> for BridgeArg {
    fn from(flag: bool) -> Self {
        BridgeArg::Flag(flag)
    }
}

pub type Handler = Arc<dyn Fn(BridgeArg) + Send + Sync>;

/// Where a handler is looked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeAddress<'a> {
    /// `name`
    Legacy(&'a str),
    /// `Bridge.v1.name`
    Namespaced(&'a str),
}

impl<'a> BridgeAddress<'a> {
    /// Parses `Bridge.v1.<name>` as namespaced and anything else as a legacy name.
    pub fn parse(path: &'a str) -> Self {
        path.strip_prefix(BRIDGE_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(|rest| rest.strip_prefix(BRIDGE_VERSION))
            .and_then(|rest| rest.strip_prefix('.'))
            .map_or(BridgeAddress::Legacy(path), BridgeAddress::Namespaced)
    }
}

impl fmt::Display for BridgeAddress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeAddress::Legacy(name) => f.write_str(name),
            BridgeAddress::Namespaced(name) => write!(f, "{BRIDGE_NAMESPACE}.{BRIDGE_VERSION}.{name}"),
        }
    }
}

struct Slot {
    id: u64,
    handler: Handler,
}

type Table = HashMap<String, Slot>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    legacy: Table,
    /// namespace -> version -> name
    namespaces: HashMap<String, HashMap<String, Table>>,
}

impl Slots {
    fn lookup(&self, address: BridgeAddress<'_>) -> Option<&Slot> {
        match address {
            BridgeAddress::Legacy(name) => self.legacy.get(name),
            BridgeAddress::Namespaced(name) => self
                .namespaces
                .get(BRIDGE_NAMESPACE)
                .and_then(|versions| versions.get(BRIDGE_VERSION))
                .and_then(|table| table.get(name)),
        }
    }

    fn namespaced_table(&mut self) -> &mut Table {
        self.namespaces
            .entry(BRIDGE_NAMESPACE.to_owned())
            .or_default()
            .entry(BRIDGE_VERSION.to_owned())
            .or_default()
    }

    /// Removes `name` from both tables if still owned by `id`, pruning empty namespace levels.
    fn release(&mut self, name: &str, id: u64) {
        if self.legacy.get(name).is_some_and(|slot| slot.id == id) {
            self.legacy.remove(name);
        }

        let Some(versions) = self.namespaces.get_mut(BRIDGE_NAMESPACE) else {
            return;
        };
        if let Some(table) = versions.get_mut(BRIDGE_VERSION) {
            if table.get(name).is_some_and(|slot| slot.id == id) {
                table.remove(name);
            }
            if table.is_empty() {
                versions.remove(BRIDGE_VERSION);
            }
        }
        if versions.is_empty() {
            self.namespaces.remove(BRIDGE_NAMESPACE);
        }
    }
}

/// Shared table of named handlers. Cloning shares the same table.
#[derive(Clone, Default)]
pub struct BridgeRegistry {
    slots: Arc<RwLock<Slots>>,
}

impl fmt::Debug for BridgeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeRegistry")
            .field("legacy", &self.legacy_names())
            .finish()
    }
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handler` under `name` and `Bridge.v1.name`, replacing any earlier owner.
    pub fn register<F>(&self, name: &str, handler: F) -> Registration
    where
        F: Fn(BridgeArg) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let mut slots = self.write();
        slots.next_id += 1;
        let id = slots.next_id;

        let replaced = slots
            .legacy
            .insert(
                name.to_owned(),
                Slot {
                    id,
                    handler: Arc::clone(&handler),
                },
            )
            .is_some();
        slots.namespaced_table().insert(name.to_owned(), Slot { id, handler });
        drop(slots);

        if replaced {
            debug!(target: "overlay::bridge", name, "bridge handler replaced");
        } else {
            trace!(target: "overlay::bridge", name, "bridge handler registered");
        }

        Registration {
            registry: Some(self.clone()),
            name: name.to_owned(),
            id,
        }
    }

    /// Runs the handler at `address`; returns whether one was installed.
    ///
    /// The handler runs outside the lock, so it may register or unregister slots.
    pub fn invoke(&self, address: BridgeAddress<'_>, arg: BridgeArg) -> bool {
        let handler = self.read().lookup(address).map(|slot| Arc::clone(&slot.handler));
        match handler {
            Some(handler) => {
                handler(arg);
                true
            }
            None => {
                debug!(target: "overlay::bridge", %address, "no bridge handler installed");
                false
            }
        }
    }

    /// [`invoke`](Self::invoke) with a dotted path such as `Bridge.v1.updateStats`.
    pub fn invoke_path(&self, path: &str, arg: BridgeArg) -> bool {
        self.invoke(BridgeAddress::parse(path), arg)
    }

    pub fn is_registered(&self, address: BridgeAddress<'_>) -> bool {
        self.read().lookup(address).is_some()
    }

    /// Sorted flat names currently installed.
    pub fn legacy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().legacy.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted names in the `Bridge.v1` table.
    pub fn namespaced_names(&self) -> Vec<String> {
        let slots = self.read();
        let mut names: Vec<String> = slots
            .namespaces
            .get(BRIDGE_NAMESPACE)
            .and_then(|versions| versions.get(BRIDGE_VERSION))
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// True when no namespace table exists at all (empty ones are pruned).
    pub fn namespace_pruned(&self) -> bool {
        !self.read().namespaces.contains_key(BRIDGE_NAMESPACE)
    }

    fn read(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slots> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ownership of one installed handler. Unregisters on drop.
#[must_use = "dropping a Registration immediately unregisters its handler"]
pub struct Registration {
    registry: Option<BridgeRegistry>,
    name: String,
    id: u64,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("active", &self.registry.is_some())
            .finish()
    }
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Removes this registration's slots. Slots taken over by a later
    /// registration of the same name are left alone. Idempotent.
    pub fn unregister(&mut self) {
        if let Some(registry) = self.registry.take() {
            registry.write().release(&self.name, self.id);
            trace!(target: "overlay::bridge", name = %self.name, "bridge handler unregistered");
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.unregister();
    }
}
