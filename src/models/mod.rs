//! Data models for movie-graph.
//!
//! This module contains the domain types shared by the store, service and
//! transport layers.

mod movie;

pub use movie::{
    AddDataRequest, AddDataResponse, Credit, Movie, MovieDetails, MovieRole, NO_ACTORS_FOUND,
    RelationshipRole, TopActor, YearInput,
};
