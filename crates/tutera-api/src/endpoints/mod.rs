// Endpoint groups, each implemented as inherent methods on `ControllerClient`.

mod climate;
mod lights;
mod locks;
mod media;
mod rooms;
mod scenes;
