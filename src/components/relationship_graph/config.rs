use super::types::Sex;

/// An sRGB colour with straight alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self {
			a: a.clamp(0.0, 1.0),
			..self
		}
	}

	pub fn to_css(self) -> String {
		format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
	}
}

pub const FEMALE_COLOR: Color = Color::rgb(0xec, 0x48, 0x99);
pub const MALE_COLOR: Color = Color::rgb(0x3b, 0x82, 0xf6);
pub const OTHER_COLOR: Color = Color::rgb(0x6b, 0x72, 0x80);

/// Fixed sex to colour mapping shared by node fills, initials discs and photo rings.
pub fn sex_color(sex: Sex) -> Color {
	match sex {
		Sex::Female => FEMALE_COLOR,
		Sex::Male => MALE_COLOR,
		Sex::Other => OTHER_COLOR,
	}
}

/// Size and colour of one edge visibility class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub size: f64,
	pub color: Color,
}

/// Styling, seeding and camera constants for the relationship canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphViewConfig {
	pub node_size: f64,
	pub selected_node_size: f64,
	/// Opacity applied to nodes dimmed by an active selection.
	pub dimmed_opacity: f64,
	pub selected_edge: EdgeStyle,
	pub neutral_edge: EdgeStyle,
	pub dimmed_edge: EdgeStyle,
	/// Half-width of the square unplaced nodes are seeded into.
	pub seed_extent: f64,
	pub layout_seed: u64,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub zoom_step: f64,
	/// Extra world-space radius accepted by hit-testing.
	pub hit_slack: f64,
}

impl Default for GraphViewConfig {
	fn default() -> Self {
		Self {
			node_size: 15.0,
			selected_node_size: 22.0,
			dimmed_opacity: 0.25,
			selected_edge: EdgeStyle {
				size: 3.5,
				color: Color::rgb(0x37, 0x41, 0x51),
			},
			neutral_edge: EdgeStyle {
				size: 2.0,
				color: Color::rgb(0x9c, 0xa3, 0xaf),
			},
			dimmed_edge: EdgeStyle {
				size: 1.0,
				color: Color::rgb(0xe5, 0xe7, 0xeb),
			},
			seed_extent: 250.0,
			layout_seed: 0x5eed,
			min_zoom: 0.1,
			max_zoom: 10.0,
			zoom_step: 1.1,
			hit_slack: 4.0,
		}
	}
}
