use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::ReEncryptionKey;
use crate::pre::PreError;

/// Logical name of a principal, e.g. `DT_1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = RegistryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RegistryError::EmptyIdentity);
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An ordered (origin, destination) pair. `A -> B` and `B -> A` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Route {
    pub from: Identity,
    pub to: Identity,
}

impl Route {
    pub fn new(from: Identity, to: Identity) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("identity must not be empty")]
    EmptyIdentity,
    #[error("duplicate re-encryption key for {0}")]
    DuplicateRoute(Route),
}

/// Where a principal listens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// ciphertext traffic
    pub data: SocketAddr,
    /// one-time key delivery from the trusted authority
    pub provision: SocketAddr,
}

impl Endpoint {
    pub fn loopback(data_port: u16, provision_port: u16) -> Self {
        let host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        Self {
            data: SocketAddr::new(host, data_port),
            provision: SocketAddr::new(host, provision_port),
        }
    }
}

/// Routing table shared by every role: the edge server plus every
/// digital twin that can originate or receive messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub edge: Endpoint,
    #[serde(default)]
    pub twins: BTreeMap<Identity, Endpoint>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut twins = BTreeMap::new();
        twins.insert(Identity::from("DT_1"), Endpoint::loopback(8085, 8081));
        twins.insert(Identity::from("DT_2"), Endpoint::loopback(8090, 8082));
        Self {
            edge: Endpoint::loopback(8084, 8083),
            twins,
        }
    }
}

impl Registry {
    pub fn new(edge: Endpoint) -> Self {
        Self {
            edge,
            twins: BTreeMap::new(),
        }
    }

    pub fn with_twin(mut self, id: Identity, endpoint: Endpoint) -> Self {
        self.twins.insert(id, endpoint);
        self
    }

    pub fn twin(&self, id: &Identity) -> Option<&Endpoint> {
        self.twins.get(id)
    }

    /// Data address to forward re-encrypted ciphertext to
    pub fn destination(&self, id: &Identity) -> Result<SocketAddr, PreError> {
        self.twin(id)
            .map(|endpoint| endpoint.data)
            .ok_or_else(|| PreError::UnknownDestination(id.clone()))
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.twins.keys()
    }

    /// Every ordered pair of distinct twins
    pub fn routes(&self) -> Vec<Route> {
        let mut routes = Vec::new();
        for from in self.twins.keys() {
            for to in self.twins.keys() {
                if from != to {
                    routes.push(Route::new(from.clone(), to.clone()));
                }
            }
        }
        routes
    }
}

/// The edge's re-encryption keys, one per ordered pair.
///
/// Filled once during provisioning and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ReKeyTable {
    keys: HashMap<Route, ReEncryptionKey>,
}

impl ReKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the key for `route`. A second key for the same pair is rejected.
    pub fn insert(&mut self, route: Route, key: ReEncryptionKey) -> Result<(), RegistryError> {
        if self.keys.contains_key(&route) {
            return Err(RegistryError::DuplicateRoute(route));
        }
        self.keys.insert(route, key);
        Ok(())
    }

    pub fn get(&self, route: &Route) -> Result<&ReEncryptionKey, PreError> {
        self.keys
            .get(route)
            .ok_or_else(|| PreError::UnknownKeyPair(route.clone()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entries in a stable order (sorted by route)
    pub fn entries(&self) -> Vec<(&Route, &ReEncryptionKey)> {
        let mut entries: Vec<_> = self.keys.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::ScalarKey;

    fn rk() -> ReEncryptionKey {
        let a = ScalarKey::generate().unwrap();
        let b = ScalarKey::generate().unwrap();
        ReEncryptionKey::derive(&a, &b).unwrap()
    }

    #[test]
    fn test_default_registry_matches_deployment() {
        let registry = Registry::default();
        assert_eq!(registry.edge.data.port(), 8084);
        assert_eq!(registry.edge.provision.port(), 8083);
        assert_eq!(
            registry.destination(&Identity::from("DT_2")).unwrap().port(),
            8090
        );
        assert_eq!(
            registry.twin(&Identity::from("DT_1")).unwrap().provision.port(),
            8081
        );
    }

    #[test]
    fn test_unknown_destination() {
        let registry = Registry::default();
        let result = registry.destination(&Identity::from("DT_9"));
        assert!(matches!(result, Err(PreError::UnknownDestination(id)) if id.as_str() == "DT_9"));
    }

    #[test]
    fn test_routes_are_ordered_pairs() {
        let registry = Registry::default().with_twin("DT_3".into(), Endpoint::loopback(1, 2));
        let routes = registry.routes();
        assert_eq!(routes.len(), 6);
        assert!(routes.contains(&Route::new("DT_1".into(), "DT_2".into())));
        assert!(routes.contains(&Route::new("DT_2".into(), "DT_1".into())));
        assert!(!routes.iter().any(|r| r.from == r.to));
    }

    #[test]
    fn test_rekey_table_rejects_duplicate_pair() {
        let mut table = ReKeyTable::new();
        let route = Route::new("DT_1".into(), "DT_2".into());
        table.insert(route.clone(), rk()).unwrap();
        assert!(matches!(
            table.insert(route.clone(), rk()),
            Err(RegistryError::DuplicateRoute(_))
        ));

        // the reverse direction is a different key
        table
            .insert(Route::new("DT_2".into(), "DT_1".into()), rk())
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_rekey_table_lookup_miss() {
        let table = ReKeyTable::new();
        let route = Route::new("DT_1".into(), "DT_2".into());
        assert!(matches!(table.get(&route), Err(PreError::UnknownKeyPair(_))));
    }

    #[test]
    fn test_identity_parse() {
        assert_eq!("  DT_1 ".parse::<Identity>().unwrap().as_str(), "DT_1");
        assert!("".parse::<Identity>().is_err());
    }

    #[test]
    fn test_registry_toml_roundtrip() {
        let registry = Registry::default();
        let toml = toml::to_string_pretty(&registry).unwrap();
        let parsed: Registry = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, registry);
    }
}
