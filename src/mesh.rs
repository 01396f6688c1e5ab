use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::types::Vertex;

/// Indexed triangle list, uploaded once per draw group.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u16 {
        let index = self.vertices.len() as u16;
        self.vertices.push(Vertex {
            position: position.to_array(),
            normal: normal.normalize_or_zero().to_array(),
        });
        index
    }

    /// Flat-shaded triangle: every face gets its own vertices.
    fn push_facet(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let normal = (b - a).cross(c - a);
        let ia = self.push_vertex(a, normal);
        let ib = self.push_vertex(b, normal);
        let ic = self.push_vertex(c, normal);
        self.indices.extend_from_slice(&[ia, ib, ic]);
    }
}

/// Octahedron stretched along Y: shards and dust.
pub fn shard(stretch: f32) -> Mesh {
    let top = Vec3::Y * stretch;
    let bottom = -Vec3::Y * stretch;
    let ring = [Vec3::X, Vec3::Z, -Vec3::X, -Vec3::Z];
    let mut mesh = Mesh::default();
    for i in 0..4 {
        let (a, b) = (ring[i], ring[(i + 1) % 4]);
        mesh.push_facet(top, b, a);
        mesh.push_facet(bottom, a, b);
    }
    mesh
}

/// Thin hexagonal plate: glass flakes.
pub fn flake() -> Mesh {
    let mut mesh = Mesh::default();
    let thickness = 0.15;
    let corners: Vec<Vec3> = (0..6)
        .map(|i| {
            let angle = i as f32 / 6.0 * TAU;
            Vec3::new(angle.cos(), 0.0, angle.sin())
        })
        .collect();
    let (up, down) = (Vec3::Y * thickness, -Vec3::Y * thickness);
    for i in 0..6 {
        let (a, b) = (corners[i], corners[(i + 1) % 6]);
        mesh.push_facet(up, b, a);
        mesh.push_facet(down, a, b);
    }
    mesh
}

/// Low-poly UV sphere: blue ornaments and ribbon lights.
pub fn sphere(rings: u16, segments: u16) -> Mesh {
    let mut mesh = Mesh::default();
    for ring in 0..=rings {
        let phi = ring as f32 / rings as f32 * PI;
        for segment in 0..=segments {
            let theta = segment as f32 / segments as f32 * TAU;
            let p = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            mesh.push_vertex(p, p);
        }
    }
    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }
    mesh
}

/// Five-pointed star with a little depth: the tree topper.
pub fn star(inner_radius: f32, depth: f32) -> Mesh {
    let mut mesh = Mesh::default();
    let outline: Vec<Vec3> = (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { 1.0 } else { inner_radius };
            let angle = i as f32 / 10.0 * TAU + PI * 0.5;
            Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
        })
        .collect();
    let (front, back) = (Vec3::Z * depth, -Vec3::Z * depth);
    for i in 0..outline.len() {
        let (a, b) = (outline[i], outline[(i + 1) % outline.len()]);
        mesh.push_facet(front, a, b);
        mesh.push_facet(back, b, a);
    }
    mesh
}

/// Tube of `radius` swept along `path`.
pub fn tube(path: &[Vec3], radius: f32, radial_segments: u16) -> Mesh {
    let mut mesh = Mesh::default();
    if path.len() < 2 {
        return mesh;
    }

    for (i, &center) in path.iter().enumerate() {
        let tangent = if i + 1 < path.len() {
            path[i + 1] - center
        } else {
            center - path[i - 1]
        }
        .normalize_or_zero();
        // any axis not parallel to the tangent works as a frame seed
        let seed = if tangent.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
        let normal = tangent.cross(seed).normalize_or_zero();
        let binormal = tangent.cross(normal);

        for segment in 0..=radial_segments {
            let angle = segment as f32 / radial_segments as f32 * TAU;
            let offset = normal * angle.cos() + binormal * angle.sin();
            mesh.push_vertex(center + offset * radius, offset);
        }
    }

    let stride = radial_segments + 1;
    for ring in 0..(path.len() as u16 - 1) {
        for segment in 0..radial_segments {
            let a = ring * stride + segment;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices_in_range(mesh: &Mesh) -> bool {
        mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len())
    }

    #[test]
    fn test_primitive_meshes_are_well_formed() {
        for mesh in [shard(1.6), flake(), sphere(6, 8), star(0.45, 0.2)] {
            assert!(!mesh.indices.is_empty());
            assert_eq!(mesh.indices.len() % 3, 0);
            assert!(indices_in_range(&mesh));
        }
    }

    #[test]
    fn test_tube_vertex_and_index_counts() {
        let path: Vec<Vec3> = (0..10).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect();
        let mesh = tube(&path, 0.1, 6);
        assert_eq!(mesh.vertices.len(), 10 * 7);
        assert_eq!(mesh.indices.len(), 9 * 6 * 6);
        assert!(indices_in_range(&mesh));
        for vertex in &mesh.vertices {
            let p = Vec3::from(vertex.position);
            assert!((Vec3::new(p.x, 0.0, p.z).length() - 0.1).abs() < 1e-5);
        }
    }

    #[test]
    fn test_tube_needs_two_points() {
        assert!(tube(&[Vec3::ZERO], 0.1, 6).vertices.is_empty());
    }
}
