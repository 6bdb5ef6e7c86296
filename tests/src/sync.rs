mod controller;
mod hypervisor;
mod sources;
