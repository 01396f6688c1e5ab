use winit::event::WindowEvent;
use winit::keyboard::{KeyCode, PhysicalKey};

/// What a window event asks the scene to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    CycleMode,
    MakeWish,
}

pub struct InputHandler;

impl InputHandler {
    pub fn handle_window_event(event: &WindowEvent) -> Option<InputAction> {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("The close button was pressed. Stopping 🛑");
                Some(InputAction::Quit)
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                match event.physical_key {
                    PhysicalKey::Code(code) => Self::action_for_key(code),
                    PhysicalKey::Unidentified(_) => None,
                }
            }
            _ => None,
        }
    }

    pub fn action_for_key(code: KeyCode) -> Option<InputAction> {
        match code {
            KeyCode::KeyQ | KeyCode::Escape => Some(InputAction::Quit),
            KeyCode::Space => Some(InputAction::CycleMode),
            KeyCode::Enter | KeyCode::KeyW => Some(InputAction::MakeWish),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_map() {
        assert_eq!(InputHandler::action_for_key(KeyCode::Escape), Some(InputAction::Quit));
        assert_eq!(InputHandler::action_for_key(KeyCode::KeyQ), Some(InputAction::Quit));
        assert_eq!(InputHandler::action_for_key(KeyCode::Space), Some(InputAction::CycleMode));
        assert_eq!(InputHandler::action_for_key(KeyCode::Enter), Some(InputAction::MakeWish));
        assert_eq!(InputHandler::action_for_key(KeyCode::KeyA), None);
    }

    #[test]
    fn test_close_request_quits() {
        assert_eq!(
            InputHandler::handle_window_event(&WindowEvent::CloseRequested),
            Some(InputAction::Quit)
        );
    }
}
