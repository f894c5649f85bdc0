mod helpers;
mod mocks;
mod ops;
mod purchase;
mod webhook;
