//! citymap - Render colourful city maps from OpenStreetMap data
//!
//! Buildings, streets, parks and water around a city centre are fetched
//! from Overpass, assembled into polygons, and drawn in a named style.
//! Buildings that touch get different palette colours.

pub mod adjacency;
pub mod api;
pub mod assembly;
pub mod city;
pub mod colouring;
pub mod config;
pub mod domain;
pub mod geometry;
pub mod osm;
pub mod render;
