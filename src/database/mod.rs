pub mod booking;
pub mod member;
pub mod organization;
pub mod postgres_repository;
pub mod workspace;

use std::sync::Arc;

use crate::database::booking::BookingRepository;
use crate::database::member::MemberRepository;
use crate::database::organization::OrganizationRepository;
use crate::database::workspace::WorkspaceRepository;

/// Everything the services need from storage, as one object-safe trait.
pub trait Repository: BookingRepository + OrganizationRepository + WorkspaceRepository + MemberRepository {}

impl<T> Repository for T where T: BookingRepository + OrganizationRepository + WorkspaceRepository + MemberRepository {}

pub type SharedRepository = Arc<dyn Repository>;
