//! Transform records: what the room remembers about each player, the
//! sparse updates clients send, and the legacy shared cube.

use cuberoom::prelude::SessionId;
use serde::{Deserialize, Deserializer, Serialize};

/// A partial transform sent by a client.
///
/// Each field is independent. Absent fields are left out of the JSON
/// entirely (never `null`), so a relayed update carries exactly what
/// its sender supplied. A field holding something other than a number
/// reads as absent; the rest of the update still applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformUpdate {
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub x: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub y: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub z: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub rx: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub ry: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub rz: Option<f64>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

impl TransformUpdate {
    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The last known pose of one connected player.
///
/// Rotation is euler angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTransform {
    pub session_id: SessionId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl PlayerTransform {
    /// A fresh record at the spawn point: origin, no rotation.
    pub fn spawn(session_id: SessionId) -> Self {
        Self {
            session_id,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
        }
    }

    /// Sparse merge: overwrite only the fields the update carries.
    pub fn apply(&mut self, update: &TransformUpdate) {
        let fields = [
            (&mut self.x, update.x),
            (&mut self.y, update.y),
            (&mut self.z, update.z),
            (&mut self.rx, update.rx),
            (&mut self.ry, update.ry),
            (&mut self.rz, update.rz),
        ];
        for (stored, incoming) in fields {
            if let Some(value) = incoming {
                *stored = value;
            }
        }
    }
}

/// Pose of the single shared cube.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubeTransform {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Default for CubeTransform {
    /// Resting on the floor at the origin.
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.5,
            z: 0.0,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
        }
    }
}

/// Room-wide state from the single-object sync model: one cube and a
/// host.
///
/// Nothing writes either field. The cube relay is stateless and no
/// message assigns a host, so a room carries the defaults for its
/// whole life.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedCubeState {
    pub cube_transform: CubeTransform,
    pub host_session_id: Option<SessionId>,
}

impl SharedCubeState {
    /// Returns the host, if one was ever assigned.
    pub fn host(&self) -> Option<&SessionId> {
        self.host_session_id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    #[test]
    fn test_apply_full_update_overwrites_everything() {
        let mut p = PlayerTransform::spawn(sid("a"));
        p.apply(&TransformUpdate {
            x: Some(1.0),
            y: Some(2.0),
            z: Some(3.0),
            rx: Some(10.0),
            ry: Some(20.0),
            rz: Some(30.0),
        });
        assert_eq!((p.x, p.y, p.z), (1.0, 2.0, 3.0));
        assert_eq!((p.rx, p.ry, p.rz), (10.0, 20.0, 30.0));
    }

    #[test]
    fn test_apply_sparse_update_keeps_other_fields() {
        let mut p = PlayerTransform::spawn(sid("a"));
        p.apply(&TransformUpdate {
            y: Some(2.0),
            rz: Some(45.0),
            ..TransformUpdate::default()
        });

        let only_x = TransformUpdate {
            x: Some(7.0),
            ..TransformUpdate::default()
        };
        p.apply(&only_x);
        p.apply(&only_x);

        assert_eq!(p.x, 7.0);
        assert_eq!(p.y, 2.0);
        assert_eq!(p.z, 0.0);
        assert_eq!(p.rx, 0.0);
        assert_eq!(p.ry, 0.0);
        assert_eq!(p.rz, 45.0);
    }

    #[test]
    fn test_apply_empty_update_is_noop() {
        let mut p = PlayerTransform::spawn(sid("a"));
        p.x = 4.0;
        let before = p.clone();
        p.apply(&TransformUpdate::default());
        assert_eq!(p, before);
    }

    #[test]
    fn test_update_omits_absent_fields_on_the_wire() {
        let update = TransformUpdate {
            x: Some(5.0),
            ..TransformUpdate::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"x":5.0}"#);
    }

    #[test]
    fn test_update_accepts_any_subset() {
        let update: TransformUpdate =
            serde_json::from_str(r#"{"ry":90,"z":-1.5}"#).unwrap();
        assert_eq!(update.ry, Some(90.0));
        assert_eq!(update.z, Some(-1.5));
        assert_eq!(update.x, None);
        assert!(!update.is_empty());
        assert!(TransformUpdate::default().is_empty());
    }

    #[test]
    fn test_player_transform_wire_shape() {
        let p = PlayerTransform::spawn(sid("aB3xY9kQz"));
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "sessionId": "aB3xY9kQz",
                "x": 0.0, "y": 0.0, "z": 0.0,
                "rx": 0.0, "ry": 0.0, "rz": 0.0
            })
        );
    }

    #[test]
    fn test_cube_defaults_rest_on_floor() {
        let shared = SharedCubeState::default();
        assert_eq!(shared.cube_transform.y, 0.5);
        assert_eq!(shared.cube_transform.x, 0.0);
        assert_eq!(shared.host(), None);
    }

    #[test]
    fn test_bad_field_reads_as_absent() {
        let update: TransformUpdate = serde_json::from_value(serde_json::json!({
            "x": "oops",
            "y": 2,
            "z": null,
            "rx": {"deg": 4},
            "ry": [1, 2]
        }))
        .unwrap();
        assert_eq!(
            update,
            TransformUpdate {
                y: Some(2.0),
                ..TransformUpdate::default()
            }
        );
    }

    #[test]
    fn test_sparse_merge_ignores_bad_fields() {
        let mut p = PlayerTransform::spawn(sid("a"));
        p.x = 3.0;
        let update: TransformUpdate =
            serde_json::from_str(r#"{"x":true,"rz":12.5}"#).unwrap();

        p.apply(&update);

        assert_eq!(p.x, 3.0);
        assert_eq!(p.rz, 12.5);
    }
}
