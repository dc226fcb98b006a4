use std::cmp::Ordering;

/// Material catalog is fixed and deterministic.
/// Only the surfaces the driving scene actually uses; pair mixing is symmetric.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MaterialId {
    Default,
    Asphalt,
    Concrete,
    Rubber,
    Ice,
}

/// Canonical single-material properties.
/// Units:
/// - friction coefficients are dimensionless
/// - restitution in [0,1]
/// - stribeck_v (m/s) sets transition speed from static→kinetic
#[derive(Copy, Clone, Debug)]
pub struct MatProps {
    pub mu_s: f32,
    pub mu_k: f32,
    pub restitution: f32,
    pub stribeck_v: f32,
}

/// Pair properties after mixing + overrides; what the solver should use.
#[derive(Copy, Clone, Debug)]
pub struct MatPairProps {
    pub mu_s: f32,
    pub mu_k: f32,
    pub restitution: f32,
    pub stribeck_v: f32,
}

/// Base single-material table.
pub fn props(id: MaterialId) -> MatProps {
    use MaterialId::*;
    match id {
        Default  => MatProps { mu_s: 0.60, mu_k: 0.50, restitution: 0.10, stribeck_v: 0.08 },
        Asphalt  => MatProps { mu_s: 0.90, mu_k: 0.80, restitution: 0.00, stribeck_v: 0.12 },
        Concrete => MatProps { mu_s: 0.80, mu_k: 0.70, restitution: 0.00, stribeck_v: 0.10 },
        Rubber   => MatProps { mu_s: 1.10, mu_k: 0.95, restitution: 0.80, stribeck_v: 0.15 },
        Ice      => MatProps { mu_s: 0.05, mu_k: 0.03, restitution: 0.02, stribeck_v: 0.02 },
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct PairOverride {
    mu_s: Option<f32>,
    mu_k: Option<f32>,
    restitution: Option<f32>,
    stribeck_v: Option<f32>,
}

/// Tire-on-road pairs do not bounce and grip better than the geometric mix.
fn override_for(a: MaterialId, b: MaterialId) -> Option<PairOverride> {
    use MaterialId::*;
    match ordered_pair(a, b) {
        (Asphalt, Rubber) => Some(PairOverride {
            mu_s: Some(1.00), mu_k: Some(0.90), restitution: Some(0.0), stribeck_v: None,
        }),
        (Concrete, Rubber) => Some(PairOverride {
            mu_s: Some(0.95), mu_k: Some(0.85), restitution: Some(0.0), stribeck_v: None,
        }),
        _ => None,
    }
}

fn mix_pair(a: MatProps, b: MatProps) -> MatPairProps {
    let mu_s = (a.mu_s * b.mu_s).abs().sqrt();
    let mu_k = (a.mu_k * b.mu_k).abs().sqrt();
    let restitution = a.restitution.max(b.restitution);
    let stribeck_v  = 0.5 * (a.stribeck_v + b.stribeck_v);
    MatPairProps { mu_s, mu_k, restitution, stribeck_v }
}

/// Public entry: compute pair properties with overrides applied.
pub fn pair_props(a: MaterialId, b: MaterialId) -> MatPairProps {
    let base = mix_pair(props(a), props(b));
    if let Some(ov) = override_for(a, b) {
        MatPairProps {
            mu_s: ov.mu_s.unwrap_or(base.mu_s),
            mu_k: ov.mu_k.unwrap_or(base.mu_k),
            restitution: ov.restitution.unwrap_or(base.restitution),
            stribeck_v: ov.stribeck_v.unwrap_or(base.stribeck_v),
        }
    } else {
        base
    }
}

/// Deterministic Stribeck curve for dynamic friction coefficient at slip speed `v`.
/// mu(v) = mu_k + (mu_s - mu_k) * exp(-(v / v_s)^2)
pub fn mu_dynamic(pair: &MatPairProps, v_slip: f32) -> f32 {
    let vs = pair.stribeck_v.max(1.0e-6);
    let t = -(v_slip / vs).powi(2);
    let mu = pair.mu_k + (pair.mu_s - pair.mu_k) * t.exp();
    quantize(mu)
}

/// Simple 1e-6 quantization for perfect determinism across platforms.
#[inline]
pub fn quantize(x: f32) -> f32 {
    (x * 1.0e6_f32).round() * 1.0e-6_f32
}

#[inline]
fn ordered_pair(a: MaterialId, b: MaterialId) -> (MaterialId, MaterialId) {
    match (a as u32).cmp(&(b as u32)) {
        Ordering::Less | Ordering::Equal => (a, b),
        Ordering::Greater                => (b, a),
    }
}
