//! Тексты, которые видит пользователь (интерфейс OMAUM на португальском)

pub const SESSION_EXPIRED: &str = "Sua sessão expirou. Faça login novamente para continuar.";
pub const RETRY_LATER: &str = "Não foi possível carregar os dados. Tente novamente mais tarde.";
pub const MALFORMED_RESPONSE: &str = "O servidor retornou uma resposta inesperada. Tente novamente mais tarde.";
pub const LOADING: &str = "Carregando...";
pub const DEFAULT_SENTINEL: &str = "Todas as turmas";
pub const NO_OPTIONS: &str = "Nenhuma turma disponível para este curso.";
pub const OPTIONS_LOAD_FAILED: &str = "Não foi possível atualizar a lista de turmas.";
pub const SUBMIT_SUCCESS: &str = "Dados salvos com sucesso.";
pub const SUBMIT_INVALID: &str = "Corrija os erros indicados e envie novamente.";
pub const SUBMITTING: &str = "Enviando...";
