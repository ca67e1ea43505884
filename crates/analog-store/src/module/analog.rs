use analog_config::RpuConfig;
use ndarray::{Array1, Array2, ArrayD, IxDyn, s};

use super::{Module, ModuleMapper, ModuleVisitor, Param};
use crate::namespace::tile_state_name;
use crate::{AnalogTile, TileError};

/// Fully connected layer whose weights live on one analog tile.
#[derive(Debug, Clone)]
pub struct AnalogLinear {
    tile: AnalogTile,
}

impl AnalogLinear {
    /// Create a layer of `d_input` inputs and `d_output` outputs.
    pub fn new(d_input: usize, d_output: usize, rpu_config: RpuConfig, bias: bool) -> Self {
        Self {
            tile: AnalogTile::new(d_output, d_input, rpu_config, bias),
        }
    }

    /// Tile of the layer.
    pub fn tile(&self) -> &AnalogTile {
        &self.tile
    }

    /// Mutable access to the tile.
    pub fn tile_mut(&mut self) -> &mut AnalogTile {
        &mut self.tile
    }
}

impl Module for AnalogLinear {
    fn visit<V: ModuleVisitor>(&self, visitor: &mut V) {
        visitor.visit_tile(&tile_state_name(0), &self.tile);
    }

    fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self {
        Self {
            tile: mapper.map_tile(&tile_state_name(0), self.tile),
        }
    }
}

/// Fully connected layer whose weight matrix is split column wise over several
/// tiles of at most `max_input_size` inputs each.
///
/// The bias is digital and stored as an ordinary parameter.
#[derive(Debug, Clone)]
pub struct AnalogMapped {
    tiles: Vec<AnalogTile>,
    bias: Option<Param>,
    d_output: usize,
}

impl AnalogMapped {
    /// Create a layer of `d_input` inputs and `d_output` outputs.
    ///
    /// A `max_input_size` of zero puts every input on a single tile.
    pub fn new(
        d_input: usize,
        d_output: usize,
        rpu_config: RpuConfig,
        bias: bool,
        max_input_size: usize,
    ) -> Self {
        let chunk = match max_input_size {
            0 => d_input.max(1),
            size => size,
        };

        let mut tiles = Vec::new();
        let mut start = 0;
        while start < d_input {
            let size = chunk.min(d_input - start);
            tiles.push(AnalogTile::new(d_output, size, rpu_config.clone(), false));
            start += size;
        }

        Self {
            tiles,
            bias: bias.then(|| Param::new(ArrayD::zeros(IxDyn(&[d_output])))),
            d_output,
        }
    }

    /// Tiles, in input order.
    pub fn tiles(&self) -> &[AnalogTile] {
        &self.tiles
    }

    /// Mutable access to the tiles.
    pub fn tiles_mut(&mut self) -> &mut [AnalogTile] {
        &mut self.tiles
    }

    /// Digital bias.
    pub fn bias(&self) -> Option<&Param> {
        self.bias.as_ref()
    }

    /// Stored weights of every tile, concatenated along the inputs.
    pub fn get_weights(&self) -> Array2<f32> {
        let mut weight = Array2::zeros((self.d_output, self.d_input()));

        let mut start = 0;
        for tile in self.tiles.iter() {
            let end = start + tile.in_size();
            weight.slice_mut(s![.., start..end]).assign(tile.weight());
            start = end;
        }

        weight
    }

    fn d_input(&self) -> usize {
        self.tiles.iter().map(AnalogTile::in_size).sum()
    }

    /// Split `weight` along the inputs and set it on the tiles.
    ///
    /// The shapes of every part are checked before any tile is modified.
    pub fn set_weights(
        &mut self,
        weight: Array2<f32>,
        bias: Option<Array1<f32>>,
    ) -> Result<(), TileError> {
        let (d_output, d_input) = (self.d_output, self.d_input());

        if weight.dim() != (d_output, d_input) {
            return Err(TileError::ShapeMismatch {
                name: "weight".to_string(),
                expected: vec![d_output, d_input],
                found: weight.shape().to_vec(),
            });
        }

        match (&self.bias, &bias) {
            (Some(current), Some(given)) if current.shape() != given.shape() => {
                return Err(TileError::ShapeMismatch {
                    name: "bias".to_string(),
                    expected: current.shape().to_vec(),
                    found: given.shape().to_vec(),
                });
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(TileError::BiasMismatch {
                    expected: self.bias.is_some(),
                    found: bias.is_some(),
                });
            }
            _ => {}
        }

        let mut start = 0;
        for tile in self.tiles.iter_mut() {
            let end = start + tile.in_size();
            tile.set_weights(weight.slice(s![.., start..end]).to_owned(), None)?;
            start = end;
        }

        self.bias = match (self.bias.take(), bias) {
            (Some(param), Some(bias)) => Some(param.with_value(bias.into_dyn())),
            (param, _) => param,
        };

        Ok(())
    }
}

impl Module for AnalogMapped {
    fn visit<V: ModuleVisitor>(&self, visitor: &mut V) {
        for (index, tile) in self.tiles.iter().enumerate() {
            visitor.visit_tile(&tile_state_name(index), tile);
        }
        if let Some(bias) = &self.bias {
            visitor.visit_param("bias", bias);
        }
    }

    fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self {
        let tiles = self
            .tiles
            .into_iter()
            .enumerate()
            .map(|(index, tile)| mapper.map_tile(&tile_state_name(index), tile))
            .collect();
        let bias = self.bias.map(|bias| mapper.map_param("bias", bias));

        Self {
            tiles,
            bias,
            d_output: self.d_output,
        }
    }
}
