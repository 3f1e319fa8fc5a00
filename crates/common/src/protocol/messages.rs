use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ProtocolError;
use crate::crypto::{
    CryptoError, IntegrityTag, KeyPair, Point, PointKey, ReEncryptionKey, ScalarKey, CURVE_NAME,
};
use crate::pre::{Ciphertext, ReEncryptedCiphertext, Timestamp};
use crate::registry::{Identity, ReKeyTable, Route};

fn check_curve(curve: &str) -> Result<(), CryptoError> {
    if curve != CURVE_NAME {
        return Err(CryptoError::UnsupportedCurve(curve.to_string()));
    }
    Ok(())
}

/// Affine point as `{"x": <int>, "y": <int>}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePoint {
    #[serde(with = "super::decimal")]
    pub x: BigUint,
    #[serde(with = "super::decimal")]
    pub y: BigUint,
}

impl WirePoint {
    pub fn from_point(point: &Point) -> Result<Self, CryptoError> {
        let (x, y) = point.coordinates()?;
        Ok(Self { x, y })
    }

    /// Fails unless `(x, y)` lies on secp256k1
    pub fn to_point(&self) -> Result<Point, CryptoError> {
        Point::from_coordinates(&self.x, &self.y)
    }
}

/// Key pair delivered by the trusted authority to a twin.
///
/// The two variants differ only in field names. Twins are issued the
/// `Originator` form; either form is accepted on receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KeyIssue {
    Originator {
        curve: String,
        #[serde(with = "super::decimal")]
        sk_org: BigUint,
        pk_org: WirePoint,
    },
    Destination {
        curve: String,
        #[serde(with = "super::decimal")]
        sk_dst: BigUint,
        pk_dst: WirePoint,
    },
}

/// Deserialisation shape for [`KeyIssue`]. `#[serde(untagged)]` buffers the
/// input and would lose the literal integers, so the variant is picked by
/// hand.
#[derive(Deserialize)]
struct RawKeyIssue {
    curve: String,
    #[serde(default, deserialize_with = "optional_decimal")]
    sk_org: Option<BigUint>,
    pk_org: Option<WirePoint>,
    #[serde(default, deserialize_with = "optional_decimal")]
    sk_dst: Option<BigUint>,
    pk_dst: Option<WirePoint>,
}

fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<BigUint>, D::Error>
where
    D: Deserializer<'de>,
{
    super::decimal::deserialize(deserializer).map(Some)
}

impl TryFrom<RawKeyIssue> for KeyIssue {
    type Error = ProtocolError;

    fn try_from(raw: RawKeyIssue) -> Result<Self, Self::Error> {
        match (raw.sk_org, raw.pk_org, raw.sk_dst, raw.pk_dst) {
            (Some(sk_org), Some(pk_org), None, None) => Ok(KeyIssue::Originator {
                curve: raw.curve,
                sk_org,
                pk_org,
            }),
            (None, None, Some(sk_dst), Some(pk_dst)) => Ok(KeyIssue::Destination {
                curve: raw.curve,
                sk_dst,
                pk_dst,
            }),
            _ => Err(ProtocolError::AmbiguousKeyIssue),
        }
    }
}

impl<'de> Deserialize<'de> for KeyIssue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawKeyIssue::deserialize(deserializer)?;
        KeyIssue::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl KeyIssue {
    pub fn originator(pair: &KeyPair) -> Result<Self, CryptoError> {
        Ok(KeyIssue::Originator {
            curve: CURVE_NAME.to_string(),
            sk_org: pair.secret().to_integer(),
            pk_org: WirePoint::from_point(pair.public())?,
        })
    }

    pub fn destination(pair: &KeyPair) -> Result<Self, CryptoError> {
        Ok(KeyIssue::Destination {
            curve: CURVE_NAME.to_string(),
            sk_dst: pair.secret().to_integer(),
            pk_dst: WirePoint::from_point(pair.public())?,
        })
    }

    /// Validate and rebuild the key pair. The public point must be the one
    /// the scalar produces.
    pub fn to_key_pair(&self) -> Result<KeyPair, CryptoError> {
        let (curve, sk, pk) = match self {
            KeyIssue::Originator {
                curve,
                sk_org,
                pk_org,
            } => (curve, sk_org, pk_org),
            KeyIssue::Destination {
                curve,
                sk_dst,
                pk_dst,
            } => (curve, sk_dst, pk_dst),
        };
        check_curve(curve)?;
        let private = ScalarKey::from_integer(sk)?;
        let public = PointKey::from_point(pk.to_point()?)?;
        KeyPair::from_parts(private, public)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReKeyEntry {
    pub from: Identity,
    pub to: Identity,
    #[serde(with = "super::decimal")]
    pub rk: BigUint,
}

/// Every re-encryption key the edge will hold, sent in one message
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReKeyBundle {
    pub reenc_keys: Vec<ReKeyEntry>,
}

impl ReKeyBundle {
    pub fn from_table(table: &ReKeyTable) -> Self {
        let reenc_keys = table
            .entries()
            .into_iter()
            .map(|(route, rk)| ReKeyEntry {
                from: route.from.clone(),
                to: route.to.clone(),
                rk: rk.to_integer(),
            })
            .collect();
        Self { reenc_keys }
    }

    /// Range-checks every key and rejects a pair listed twice
    pub fn to_table(&self) -> Result<ReKeyTable, ProtocolError> {
        let mut table = ReKeyTable::new();
        for entry in &self.reenc_keys {
            let rk = ReEncryptionKey::from_integer(&entry.rk)?;
            table.insert(Route::new(entry.from.clone(), entry.to.clone()), rk)?;
        }
        Ok(table)
    }
}

/// Originator to edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub src_dt_id: Identity,
    pub dest_dt_id: Identity,
    pub curve: String,
    pub c_t: WirePoint,
    pub c_m: WirePoint,
    #[serde(rename = "hM")]
    pub h_m: String,
    #[serde(rename = "Torg")]
    pub t_org: f64,
}

impl EncryptedPayload {
    pub fn seal(
        src: Identity,
        dest: Identity,
        ciphertext: &Ciphertext,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            src_dt_id: src,
            dest_dt_id: dest,
            curve: CURVE_NAME.to_string(),
            c_t: WirePoint::from_point(&ciphertext.c_t)?,
            c_m: WirePoint::from_point(&ciphertext.c_m)?,
            h_m: ciphertext.integrity_tag.to_hex(),
            t_org: ciphertext.origin_timestamp.as_secs(),
        })
    }

    pub fn route(&self) -> Route {
        Route::new(self.src_dt_id.clone(), self.dest_dt_id.clone())
    }

    pub fn to_ciphertext(&self) -> Result<Ciphertext, CryptoError> {
        check_curve(&self.curve)?;
        Ok(Ciphertext {
            c_t: self.c_t.to_point()?,
            c_m: self.c_m.to_point()?,
            integrity_tag: IntegrityTag::from_hex(&self.h_m)?,
            origin_timestamp: Timestamp::from_secs(self.t_org),
        })
    }
}

/// Edge to destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReEncryptedPayload {
    pub curve: String,
    pub c_t_prime: WirePoint,
    pub c_m: WirePoint,
    #[serde(rename = "hM")]
    pub h_m: String,
    #[serde(rename = "Tproxy")]
    pub t_proxy: f64,
}

impl ReEncryptedPayload {
    pub fn seal(ciphertext: &ReEncryptedCiphertext) -> Result<Self, CryptoError> {
        Ok(Self {
            curve: CURVE_NAME.to_string(),
            c_t_prime: WirePoint::from_point(&ciphertext.c_t_prime)?,
            c_m: WirePoint::from_point(&ciphertext.c_m)?,
            h_m: ciphertext.integrity_tag.to_hex(),
            t_proxy: ciphertext.proxy_timestamp.as_secs(),
        })
    }

    pub fn to_ciphertext(&self) -> Result<ReEncryptedCiphertext, CryptoError> {
        check_curve(&self.curve)?;
        Ok(ReEncryptedCiphertext {
            c_t_prime: self.c_t_prime.to_point()?,
            c_m: self.c_m.to_point()?,
            integrity_tag: IntegrityTag::from_hex(&self.h_m)?,
            proxy_timestamp: Timestamp::from_secs(self.t_proxy),
        })
    }
}
