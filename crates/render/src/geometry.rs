use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Parametric geometry of a mesh node, in the node's local space.
///
/// All shapes are centered on the local origin. Cylinders and cones are
/// aligned with +Y; a cone is a cylinder whose top radius is zero. Planes lie
/// in the local XY plane facing +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
    },
}

/// Hashable identity of a [`Geometry`], used by backends to share GPU buffers
/// between nodes with identical geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryKey {
    kind: u8,
    params: [u32; 4],
}

/// Triangle list produced by [`Geometry::tessellate`].
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
}

impl Geometry {
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self::Cylinder {
            radius_top: 0.0,
            radius_bottom: radius,
            height,
            radial_segments,
        }
    }

    pub fn is_cone(&self) -> bool {
        matches!(self, Self::Cylinder { radius_top, .. } if *radius_top == 0.0)
    }

    /// Half-size of the local axis-aligned bounding box.
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Self::Box {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth) * 0.5,
            Self::Sphere { radius, .. } => Vec3::splat(radius),
            Self::Cylinder {
                radius_top,
                radius_bottom,
                height,
                ..
            } => {
                let r = radius_top.max(radius_bottom);
                Vec3::new(r, height * 0.5, r)
            }
            Self::Plane { width, height } => Vec3::new(width * 0.5, height * 0.5, 0.0),
        }
    }

    pub fn key(&self) -> GeometryKey {
        let (kind, params) = match *self {
            Self::Box {
                width,
                height,
                depth,
            } => (0, [width.to_bits(), height.to_bits(), depth.to_bits(), 0]),
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => (1, [radius.to_bits(), width_segments, height_segments, 0]),
            Self::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => (
                2,
                [
                    radius_top.to_bits(),
                    radius_bottom.to_bits(),
                    height.to_bits(),
                    radial_segments,
                ],
            ),
            Self::Plane { width, height } => (3, [width.to_bits(), height.to_bits(), 0, 0]),
        };
        GeometryKey { kind, params }
    }

    /// Generate a triangle list for this geometry.
    pub fn tessellate(&self) -> MeshData {
        match *self {
            Self::Box {
                width,
                height,
                depth,
            } => box_mesh(Vec3::new(width, height, depth) * 0.5),
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere_mesh(radius, width_segments.max(3), height_segments.max(2)),
            Self::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => cylinder_mesh(radius_top, radius_bottom, height, radial_segments.max(3)),
            Self::Plane { width, height } => plane_mesh(width * 0.5, height * 0.5),
        }
    }
}

fn box_mesh(h: Vec3) -> MeshData {
    let (x, y, z) = (h.x, h.y, h.z);
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0],  [[-x, -y,  z], [ x, -y,  z], [ x,  y,  z], [-x,  y,  z]]),
        ([0.0, 0.0, -1.0], [[ x, -y, -z], [-x, -y, -z], [-x,  y, -z], [ x,  y, -z]]),
        ([1.0, 0.0, 0.0],  [[ x, -y,  z], [ x, -y, -z], [ x,  y, -z], [ x,  y,  z]]),
        ([-1.0, 0.0, 0.0], [[-x, -y, -z], [-x, -y,  z], [-x,  y,  z], [-x,  y, -z]]),
        ([0.0, 1.0, 0.0],  [[-x,  y,  z], [ x,  y,  z], [ x,  y, -z], [-x,  y, -z]]),
        ([0.0, -1.0, 0.0], [[-x, -y, -z], [ x, -y, -z], [ x, -y,  z], [-x, -y,  z]]),
    ];

    let mut mesh = MeshData::default();
    for (normal, corners) in faces {
        let base = mesh.positions.len() as u16;
        for corner in corners {
            mesh.positions.push(corner);
            mesh.normals.push(normal);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let row = width_segments + 1;

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            mesh.positions.push((normal * radius).to_array());
            mesh.normals.push(normal.to_array());
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = (iy * row + ix + 1) as u16;
            let b = (iy * row + ix) as u16;
            let c = ((iy + 1) * row + ix) as u16;
            let d = ((iy + 1) * row + ix + 1) as u16;
            // Poles collapse to a single triangle per segment.
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

fn cylinder_mesh(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = height * 0.5;
    let slope = (radius_bottom - radius_top) / height;

    // Side wall: two rings, top then bottom.
    for (radius, y) in [(radius_top, half), (radius_bottom, -half)] {
        for ix in 0..=segments {
            let theta = ix as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            mesh.positions.push([radius * sin, y, radius * cos]);
            mesh.normals
                .push(Vec3::new(sin, slope, cos).normalize().to_array());
        }
    }
    let row = (segments + 1) as u16;
    for ix in 0..segments as u16 {
        let a = ix;
        let b = row + ix;
        let c = row + ix + 1;
        let d = ix + 1;
        mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    if radius_top > 0.0 {
        cap(&mut mesh, radius_top, half, segments, true);
    }
    if radius_bottom > 0.0 {
        cap(&mut mesh, radius_bottom, -half, segments, false);
    }
    mesh
}

fn cap(mesh: &mut MeshData, radius: f32, y: f32, segments: u32, top: bool) {
    let normal = if top { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
    let center = mesh.positions.len() as u16;
    mesh.positions.push([0.0, y, 0.0]);
    mesh.normals.push(normal);

    for ix in 0..=segments {
        let theta = ix as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.positions.push([radius * sin, y, radius * cos]);
        mesh.normals.push(normal);
    }
    for ix in 0..segments as u16 {
        let i = center + 1 + ix;
        if top {
            mesh.indices.extend_from_slice(&[i, i + 1, center]);
        } else {
            mesh.indices.extend_from_slice(&[i + 1, i, center]);
        }
    }
}

fn plane_mesh(hx: f32, hy: f32) -> MeshData {
    let normal = [0.0, 0.0, 1.0];
    MeshData {
        positions: vec![[-hx, -hy, 0.0], [hx, -hy, 0.0], [hx, hy, 0.0], [-hx, hy, 0.0]],
        normals: vec![normal; 4],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}
