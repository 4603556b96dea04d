pub mod listing_dto;
pub mod view_dto;
