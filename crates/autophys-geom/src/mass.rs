use autophys_core::types::Vec3;
use autophys_materials::MaterialId;

#[derive(Copy, Clone, Debug)]
pub struct Material {
    pub density: f32,
    pub restitution: f32,
    pub id: MaterialId,
}
impl Default for Material {
    fn default() -> Self { Self { density: 1000.0, restitution: 0.0, id: MaterialId::Default } }
}
impl Material {
    pub fn asphalt() -> Self { Self { density: 2400.0, restitution: 0.0, id: MaterialId::Asphalt } }
    pub fn rubber() -> Self { Self { density: 1100.0, restitution: 0.0, id: MaterialId::Rubber } }
}

#[derive(Copy, Clone, Debug)]
pub struct MassProps {
    pub mass: f32,
    pub inv_mass: f32,
}

impl MassProps {
    pub fn infinite() -> Self {
        Self { mass: f32::INFINITY, inv_mass: 0.0 }
    }

    pub fn from_mass(mass: f32) -> Self {
        assert!(mass > 0.0, "dynamic mass must be positive, got {mass}");
        Self { mass, inv_mass: 1.0 / mass }
    }

    pub fn from_sphere(radius: f32, density: f32) -> Self {
        let vol = (4.0 / 3.0) * core::f32::consts::PI * radius * radius * radius;
        Self::from_mass(density * vol)
    }

    pub fn from_box(half: Vec3, density: f32) -> Self {
        let dims = half * 2.0;
        Self::from_mass(density * dims.x * dims.y * dims.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autophys_core::vec3;

    #[test] fn box_mass_scales_with_volume() {
        let a = MassProps::from_box(vec3(0.5, 0.5, 0.5), 1000.0);
        let b = MassProps::from_box(vec3(1.0, 0.5, 0.5), 1000.0);
        assert!((b.mass / a.mass - 2.0).abs() < 1e-5);
    }
    #[test] fn infinite_is_static() {
        assert_eq!(MassProps::infinite().inv_mass, 0.0);
    }
}
